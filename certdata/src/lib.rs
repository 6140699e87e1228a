//! # certdata
//!
//! Converts an NSS `certdata.txt` object dump into a PEM bundle holding
//! only the certificates trusted as certificate authorities.
//!
//! ```text
//! CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE
//! CKA_LABEL UTF8 "Example Root CA"
//! CKA_VALUE MULTILINE_OCTAL
//! \060\202\003...
//! END
//! CKA_CLASS CK_OBJECT_CLASS CKO_NSS_TRUST
//! CKA_TRUST_SERVER_AUTH CK_TRUST CKT_NSS_TRUSTED_DELEGATOR
//! ```
//!
//! ## Example
//!
//! ```
//! use certdata::{Options, convert};
//!
//! let input = "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\n\
//!              CKA_LABEL UTF8 \"Example\"\n\
//!              CKA_VALUE MULTILINE_OCTAL\n\
//!              \\101\\102\\103\n\
//!              END\n\
//!              CKA_CLASS CK_OBJECT_CLASS CKO_NSS_TRUST\n\
//!              CKA_TRUST_SERVER_AUTH CK_TRUST CKT_NSS_TRUSTED_DELEGATOR\n";
//! let mut output = Vec::new();
//! let summary = convert(input.as_bytes(), &mut output, Options::default()).unwrap();
//! assert_eq!(1, summary.written);
//! assert_eq!(
//!     "\nExample\n=======\n-----BEGIN CERTIFICATE-----\nQUJD\n-----END CERTIFICATE-----\n",
//!     String::from_utf8(output).unwrap()
//! );
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod label;
mod matcher;
pub mod octal;
pub mod parser;
pub mod tokenizer;
pub mod trust;
pub mod writer;

use std::io::{BufRead, Write};

pub use error::Error;
pub use parser::{Converter, Summary};

/// Conversion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Write the label banner above each certificate.
    pub include_label: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            include_label: true,
        }
    }
}

/// Reads `input` to the end and appends every CA certificate to `output`.
pub fn convert<R: BufRead, W: Write>(
    input: R,
    output: W,
    options: Options,
) -> Result<Summary, Error> {
    let mut converter = Converter::new(output, options)?;
    converter.run(input)
}
