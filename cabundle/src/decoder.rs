//! Decoder trait for type-safe conversions.
//!
//! `Decoder<T, D>` converts a source `T` into a destination `D`. The
//! destination must opt in through the `DecodableFrom<T>` marker, which
//! keeps the set of valid conversions explicit.
//!
//! ```no_run
//! use cabundle::decoder::{Decoder, DecodableFrom};
//!
//! struct HexText(String);
//!
//! #[derive(Debug)]
//! struct HexError;
//!
//! impl DecodableFrom<HexText> for Vec<u8> {}
//!
//! impl Decoder<HexText, Vec<u8>> for HexText {
//!     type Error = HexError;
//!
//!     fn decode(&self) -> Result<Vec<u8>, Self::Error> {
//!         (0..self.0.len())
//!             .step_by(2)
//!             .map(|i| u8::from_str_radix(&self.0[i..i + 2], 16).map_err(|_| HexError))
//!             .collect()
//!     }
//! }
//! ```

/// Decoder trait for converting from type `T` to type `D`.
///
/// Implemented by the source type. The destination type must implement
/// `DecodableFrom<T>`.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
pub trait DecodableFrom<T> {}
