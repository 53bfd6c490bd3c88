//! Encoder trait, the reverse direction of [`crate::decoder::Decoder`].

/// Encodes `self` (of type `T`) into type `E`.
///
/// ```ignore
/// use kura::encoder::Encoder;
///
/// let tlv: Tlv = content_info.encode()?;
/// let bytes: Vec<u8> = tlv.encode()?;
/// ```
pub trait Encoder<T, E: EncodableTo<T>> {
    type Error;

    fn encode(&self) -> Result<E, Self::Error>;
}

/// Marker trait indicating that type `E` can be produced from type `T`.
pub trait EncodableTo<T> {}
