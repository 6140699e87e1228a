use std::fmt::{Display, Formatter};

use crate::error::LabelFault;

const UNDERLINE: char = '=';

/// Replaces every `\xNN` escape of a raw `CKA_LABEL` value with the byte
/// `NN`. Any other backslash is kept as is, together with the character
/// after it.
///
/// Consecutive escapes form one byte run, so `\xC3\x9C` composes one UTF-8
/// character. Bytes of a run that are not valid UTF-8 are each taken as the
/// code point of the same value. Literal characters pass through unchanged.
pub fn unescape(raw: &str) -> Result<String, LabelFault> {
    let mut out = String::with_capacity(raw.len());
    let mut run = Vec::new();
    let mut chars = raw.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some((_, 'x')) => {
                    let invalid = || LabelFault::InvalidEscape(raw[i..].to_string());
                    let hex = raw
                        .get(i + 2..i + 4)
                        .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                        .ok_or_else(invalid)?;
                    run.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
                    // 'x' and both hex digits
                    chars.nth(2);
                    continue;
                }
                Some(&(_, next)) => {
                    flush_escapes(&mut run, &mut out);
                    out.push(c);
                    out.push(next);
                    chars.next();
                    continue;
                }
                None => {}
            }
        }
        flush_escapes(&mut run, &mut out);
        out.push(c);
    }
    flush_escapes(&mut run, &mut out);

    Ok(out)
}

fn flush_escapes(run: &mut Vec<u8>, out: &mut String) {
    for chunk in run.utf8_chunks() {
        out.push_str(chunk.valid());
        out.extend(chunk.invalid().iter().map(|b| char::from(*b)));
    }
    run.clear();
}

/// The label heading of a bundle entry: the unescaped label followed by a
/// row of `=` of the same character length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    label: String,
}

impl Banner {
    pub fn from_escaped(raw: &str) -> Result<Self, LabelFault> {
        if raw.is_empty() {
            return Err(LabelFault::Empty);
        }
        Ok(Banner {
            label: unescape(raw)?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn underline(&self) -> String {
        UNDERLINE.to_string().repeat(self.label.chars().count())
    }
}

impl Display for Banner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.label)?;
        writeln!(f, "{}", self.underline())
    }
}
