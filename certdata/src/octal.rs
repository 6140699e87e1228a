use cabundle::decoder::{DecodableFrom, Decoder};
use regex::Regex;

use crate::error::ValueFault;

/// One body line of a `MULTILINE_OCTAL` block, e.g. `\060\202\005\041`.
///
/// `group` is the compiled three-digit matcher shared by the converter.
pub struct OctalLine<'a> {
    text: &'a str,
    group: &'a Regex,
}

impl<'a> OctalLine<'a> {
    pub fn new(text: &'a str, group: &'a Regex) -> Self {
        OctalLine { text, group }
    }
}

impl<'a> DecodableFrom<OctalLine<'a>> for Vec<u8> {}

impl<'a> Decoder<OctalLine<'a>, Vec<u8>> for OctalLine<'a> {
    type Error = ValueFault;

    /// Decodes every group into one byte. Any bad group fails the whole
    /// line, so no partial bytes escape.
    fn decode(&self) -> Result<Vec<u8>, Self::Error> {
        let groups = self
            .text
            .split('\\')
            .filter(|g| !g.is_empty())
            .collect::<Vec<&str>>();
        if groups.is_empty() {
            return Err(ValueFault::NoGroups);
        }

        groups
            .into_iter()
            .map(|g| {
                if !self.group.is_match(g) {
                    return Err(ValueFault::InvalidGroup(g.to_string()));
                }
                u8::from_str_radix(g, 8).map_err(|_| ValueFault::OutOfRange(g.to_string()))
            })
            .collect()
    }
}
