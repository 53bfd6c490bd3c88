//! Decoder trait for type-safe conversions.
//!
//! The `Decoder` trait converts a source type `T` into a destination type
//! `D`. The crates of the workspace use it at every structural seam: bytes
//! into TLV nodes, TLV nodes into PKCS structures.
//!
//! # Design Pattern
//!
//! 1. `Decoder<T, D>` performs the conversion
//! 2. `DecodableFrom<T>` marks `D` as a valid target for `T`
//!
//! # Implementation Guide
//!
//! ```no_run
//! use kura::decoder::{Decoder, DecodableFrom};
//!
//! struct Raw(Vec<u8>);
//! struct Parsed(usize);
//!
//! #[derive(Debug)]
//! struct ParseError;
//!
//! impl DecodableFrom<Raw> for Parsed {}
//!
//! impl Decoder<Raw, Parsed> for Raw {
//!     type Error = ParseError;
//!
//!     fn decode(&self) -> Result<Parsed, Self::Error> {
//!         Ok(Parsed(self.0.len()))
//!     }
//! }
//! ```

/// Decoder trait for converting from type `T` to type `D`.
///
/// Implemented on the source type. A source type may implement several
/// decoders; the destination is then picked by type inference:
///
/// ```ignore
/// use kura::decoder::Decoder;
/// use kura_pkcs::pkcs7::ContentInfo;
///
/// let info: ContentInfo = tlv.decode()?;
/// ```
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not describe a valid `D`.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
///
/// It has no methods. Implement it next to the matching `Decoder`:
///
/// ```no_run
/// use kura::decoder::DecodableFrom;
///
/// struct Source;
/// struct Target;
///
/// impl DecodableFrom<Source> for Target {}
/// ```
pub trait DecodableFrom<T> {}
