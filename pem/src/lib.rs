pub mod error;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use cabundle::{
    decoder::{DecodableFrom, Decoder},
    encoder::{EncodableTo, Encoder},
};
use error::Error;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Raw bytes carried by one base64 line. OpenSSL wraps at 64 columns,
/// and 64 * 3 / 4 = 48.
pub const LINE_BYTES: usize = 48;
/// Characters in a full base64 line.
pub const LINE_CHARS: usize = 64;

const NEWLINE: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// X.509 Certificate
    Certificate,
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Certificate => write!(f, "{}", CERTIFICATE_LABEL),
        }
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CERTIFICATE_LABEL => Ok(Label::Certificate),
            _ => Err(Error::InvalidLabel),
        }
    }
}

impl Label {
    pub fn header(&self) -> String {
        format!("-----BEGIN {}-----", self)
    }

    pub fn footer(&self) -> String {
        format!("-----END {}-----", self)
    }
}

/// Controls which framing [`Pem::segments`] emits around the data lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit the `-----BEGIN/END-----` boundary lines.
    pub boundaries: bool,
    /// Emit a newline segment after the header, every data line and the footer.
    pub newlines: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            boundaries: true,
            newlines: true,
        }
    }
}

/*
ref: https://www.rfc-editor.org/rfc/rfc7468.html#section-3
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    label: Label,
    data: Vec<u8>, // raw DER bytes
}

impl Pem {
    pub fn new(label: Label, data: Vec<u8>) -> Self {
        Pem { label, data }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Base64 encodes the data one 48-byte chunk at a time.
    ///
    /// Every returned line holds at most 64 characters; the last chunk may
    /// be shorter and carries the padding. Empty data yields no lines.
    pub fn base64_lines(&self) -> Result<Vec<String>, Error> {
        let mut lines = Vec::with_capacity(self.data.len().div_ceil(LINE_BYTES));
        let mut buf = [0u8; LINE_CHARS];
        for chunk in self.data.chunks(LINE_BYTES) {
            let written = STANDARD
                .encode_slice(chunk, &mut buf)
                .map_err(Error::Base64Encode)?;
            let line = std::str::from_utf8(&buf[..written]).map_err(|_| Error::InvalidBase64Line)?;
            lines.push(line.to_string());
        }
        Ok(lines)
    }

    /// Builds the ordered output segments: optional header, optional
    /// newline, the data lines each optionally followed by a newline,
    /// optional footer and optional trailing newline.
    ///
    /// On failure nothing is returned, so a truncated block can never be
    /// written.
    pub fn segments(&self, options: EncodeOptions) -> Result<Vec<String>, Error> {
        let lines = self.base64_lines()?;
        let mut segments = Vec::with_capacity(lines.len() * 2 + 4);
        if options.boundaries {
            segments.push(self.label.header());
        }
        if options.newlines {
            segments.push(NEWLINE.to_string());
        }
        for line in lines {
            segments.push(line);
            if options.newlines {
                segments.push(NEWLINE.to_string());
            }
        }
        if options.boundaries {
            segments.push(self.label.footer());
        }
        if options.newlines {
            segments.push(NEWLINE.to_string());
        }
        Ok(segments)
    }
}

impl Display for Pem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let lines = self.base64_lines().map_err(|_| std::fmt::Error)?;
        writeln!(f, "{}", self.label.header())?;
        for line in lines {
            writeln!(f, "{}", line)?;
        }
        write!(f, "{}", self.label.footer())
    }
}

impl EncodableTo<Vec<u8>> for Pem {}

impl Encoder<Vec<u8>, Pem> for Vec<u8> {
    type Error = Error;

    fn encode(&self) -> Result<Pem, Self::Error> {
        if self.is_empty() {
            return Err(Error::MissingData);
        }
        Ok(Pem::new(Label::Certificate, self.clone()))
    }
}

impl DecodableFrom<Pem> for Vec<u8> {}

impl Decoder<Pem, Vec<u8>> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.data.clone())
    }
}

impl FromStr for Pem {
    type Err = Error;

    /// Reads back a single block as written by [`Pem::segments`]. Text before
    /// the header (such as a label banner) is skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(str::trim_end);
        let label = lines
            .by_ref()
            .find_map(|line| boundary_label(line, "BEGIN"))
            .ok_or(Error::MissingPreEncapsulationBoundary)??;

        let mut base64_data = String::new();
        loop {
            let line = lines.next().ok_or(Error::MissingPostEncapsulationBoundary)?;
            if let Some(end) = boundary_label(line, "END") {
                if end? != label {
                    return Err(Error::InvalidLabel);
                }
                break;
            }
            if line.is_empty() || line.len() > LINE_CHARS {
                return Err(Error::InvalidBase64Line);
            }
            base64_data.push_str(line);
        }
        if base64_data.is_empty() {
            return Err(Error::MissingData);
        }

        let data = STANDARD.decode(&base64_data).map_err(Error::Base64Decode)?;
        Ok(Pem { label, data })
    }
}

fn boundary_label(line: &str, kind: &str) -> Option<Result<Label, Error>> {
    line.strip_prefix("-----")
        .and_then(|rest| rest.strip_suffix("-----"))
        .and_then(|inner| inner.strip_prefix(kind))
        .and_then(|inner| inner.strip_prefix(' '))
        .map(Label::from_str)
}
