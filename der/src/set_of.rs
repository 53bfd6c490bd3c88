//! Canonical SET OF ordering.
//!
//! Elements are encoded independently and ordered by their encodings,
//! compared byte by byte. Re-serializing a set always goes through here so
//! the output does not depend on insertion order.

use crate::tag::Tag;
use crate::tlv::{Tlv, encode_tlv};

pub fn sort_canonical(elements: &mut [Tlv]) {
    elements.sort_by_cached_key(Tlv::to_der);
}

/// Encodes a SET OF from already encoded elements.
pub fn encode_set_of<I>(elements: I) -> Vec<u8>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let mut encoded: Vec<Vec<u8>> = elements.into_iter().collect();
    encoded.sort();
    encode_tlv(Tag::SET, &encoded.concat())
}
