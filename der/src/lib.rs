//! # kura-der
//!
//! Tag-length-value engine for ASN.1 BER and DER.
//!
//! - [`Tlv`] parses BER (including indefinite lengths) and always
//!   re-encodes with minimal definite lengths.
//! - [`ObjectIdentifier`] is the OID codec.
//! - [`set_of`] provides canonical SET OF ordering.
//! - [`block`] pulls one top-level block (raw or PEM) out of a stream.
//!
//! Every decode is bounded by [`Limits`].

#![forbid(unsafe_code)]

pub mod block;
pub mod error;
pub mod limits;
pub mod oid;
mod parse;
pub mod reader;
pub mod set_of;
pub mod tag;
pub mod tlv;

pub use block::{BlockReader, read_one_block};
pub use error::{Error, Result};
pub use limits::Limits;
pub use oid::ObjectIdentifier;
pub use reader::SequenceReader;
pub use tag::{Tag, TagClass};
pub use tlv::{Tlv, decode_tlv, decode_tlv_with_limits, encode_tlv};
