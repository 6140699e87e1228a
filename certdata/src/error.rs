use thiserror::Error;

/// Fatal conversion errors. Each one stops the run; blocks already written
/// to the bundle stay in place.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build line matcher: {0}")]
    Setup(#[from] regex::Error),

    #[error("read \"CKA_LABEL UTF8\" value at line {line}: {reason}")]
    ReadLabel { line: usize, reason: LabelFault },

    #[error("read \"CKA_VALUE MULTILINE_OCTAL\" value at line {line}: {reason}")]
    MalformedValue { line: usize, reason: ValueFault },

    #[error("encode certificate value ending at line {line}: {source}")]
    Encode {
        line: usize,
        source: pem::error::Error,
    },

    #[error("read \"CKA_TRUST_\" value at line {line}")]
    TrustRead { line: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process status reported for this error. Success is 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Io(_) => 1,
            Error::ReadLabel { .. } => 2,
            Error::MalformedValue { .. } => 3,
            Error::TrustRead { .. } => 4,
            Error::Encode { .. } => 250,
            Error::Setup(_) => 254,
        }
    }
}

/// Why a label line could not be read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelFault {
    #[error("empty label")]
    Empty,
    #[error("invalid hex escape {0:?}")]
    InvalidEscape(String),
}

/// Why a line inside a `MULTILINE_OCTAL` block was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueFault {
    #[error("blank or comment line inside value block")]
    Interrupted,
    #[error("no octal groups")]
    NoGroups,
    #[error("invalid octal group {0:?}")]
    InvalidGroup(String),
    #[error("octal group {0:?} does not fit in a byte")]
    OutOfRange(String),
}

/// A trust token outside the known vocabulary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrustFault {
    #[error("unknown trust purpose {0:?}")]
    UnknownPurpose(String),
    #[error("unknown trust level {0:?}")]
    UnknownLevel(String),
}
