use base64::{DecodeError, EncodeSliceError};
use thiserror::Error;

/// Errors that can occur when building or reading PEM data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Missing the opening boundary marker (e.g., `-----BEGIN CERTIFICATE-----`)
    #[error("missing a pre encapsulation boundary")]
    MissingPreEncapsulationBoundary,

    /// Missing the closing boundary marker (e.g., `-----END CERTIFICATE-----`)
    #[error("missing a post encapsulation boundary")]
    MissingPostEncapsulationBoundary,

    /// Nothing to encode, or no data between boundary markers
    #[error("missing PEM data")]
    MissingData,

    /// The label in the boundary marker is not recognized
    #[error("invalid label")]
    InvalidLabel,

    /// A data line is longer than 64 characters or empty
    #[error("invalid base64line")]
    InvalidBase64Line,

    /// Failed to encode a chunk into its line buffer
    #[error("base64 encode: {0}")]
    Base64Encode(EncodeSliceError),

    /// Failed to decode base64 data
    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),
}
