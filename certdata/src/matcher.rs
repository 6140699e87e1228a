use regex::Regex;

use crate::error::Error;

pub(crate) const OCTET_PATTERN: &str = r"^[0-7]{3}$";

/// The fixed line patterns, compiled once per conversion.
/// Keywords match case-insensitively against the trimmed line.
#[derive(Debug, Clone)]
pub(crate) struct Matchers {
    pub(crate) certificate: Regex,
    pub(crate) label: Regex,
    pub(crate) value: Regex,
    pub(crate) end: Regex,
    pub(crate) octet: Regex,
    pub(crate) trust: Regex,
    pub(crate) trust_pair: Regex,
}

impl Matchers {
    pub(crate) fn new() -> Result<Self, Error> {
        Ok(Matchers {
            certificate: Regex::new(r"(?i)^CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE$")?,
            label: Regex::new(r#"(?i)^CKA_LABEL UTF8 "([^"]*)""#)?,
            value: Regex::new(r"(?i)^CKA_VALUE MULTILINE_OCTAL$")?,
            end: Regex::new(r"(?i)^END$")?,
            octet: Regex::new(OCTET_PATTERN)?,
            trust: Regex::new(r"(?i)^CKA_CLASS CK_OBJECT_CLASS CKO_NSS_TRUST$")?,
            trust_pair: Regex::new(r"(?i)^CKA_TRUST_([a-z_]+) CK_TRUST CKT_NSS_([a-z_]+)$")?,
        })
    }
}
