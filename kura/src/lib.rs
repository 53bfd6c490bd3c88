//! # kura
//!
//! Core traits for encoding and decoding in the kura certificate and key
//! container stack.
//!
//! ## Overview
//!
//! Every layer of the stack converts one representation into the next:
//! ```text
//! bytes / PEM → Tlv → ContentInfo → SignedData / PFX → keystore entries
//! ```
//!
//! Each step implements `Decoder` to move up a layer and `Encoder` to move
//! back down. The marker traits `DecodableFrom` and `EncodableTo` restrict
//! which pairs of types may be converted, so an impossible conversion is a
//! compile error rather than a runtime failure.
//!
//! ## Example
//!
//! ```ignore
//! use kura::decoder::Decoder;
//! use kura::encoder::Encoder;
//! use kura_der::Tlv;
//!
//! let bytes: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x05];
//! let tlv: Tlv = bytes.decode().unwrap();
//!
//! let encoded: Vec<u8> = tlv.encode().unwrap();
//! assert_eq!(bytes, encoded.as_slice());
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
