use std::io::{self, BufRead};

use log::warn;

/// A cleaned input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank line or comment (first non-blank character is `#`).
    Blank,
    /// Trimmed content.
    Content(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanLine {
    /// 1-based physical line number.
    pub number: usize,
    pub line: Line,
}

impl CleanLine {
    fn new(number: usize, text: &str) -> Self {
        let text = text.trim();
        let line = if text.is_empty() || text.starts_with('#') {
            Line::Blank
        } else {
            Line::Content(text.to_string())
        };
        CleanLine { number, line }
    }
}

/// Splits a byte stream into [`CleanLine`]s.
///
/// Lines are separated by `\n`; a trailing `\r` is dropped. Bytes that are
/// not valid UTF-8 are replaced and the line is still yielded.
pub struct Tokenizer<R> {
    reader: R,
    number: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Tokenizer {
            reader,
            number: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = io::Result<CleanLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.number += 1;
                let raw = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
                let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
                let line = match std::str::from_utf8(raw) {
                    Ok(text) => CleanLine::new(self.number, text),
                    Err(e) => {
                        warn!(
                            "line {} is not valid UTF-8 ({}), decoding lossily",
                            self.number, e
                        );
                        CleanLine::new(self.number, &String::from_utf8_lossy(raw))
                    }
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
