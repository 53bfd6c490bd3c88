use thiserror::Error;

use crate::tag::Tag;

/// Errors raised while decoding or encoding TLV structures.
///
/// Everything except `Io` and `Pem` describes a malformed encoding.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parser error {0:?}")]
    Parser(nom::error::ErrorKind),
    #[error("parser incomplete: {0:?}")]
    ParserIncomplete(nom::Needed),
    #[error("truncated input")]
    Truncated,
    #[error("multi-byte tag numbers are not supported (tag byte {0:#04x})")]
    UnsupportedTagNumber(u8),
    #[error("reserved length byte 0xff")]
    ReservedLength,
    #[error("length field of {0} bytes is too wide")]
    LengthTooWide(usize),
    #[error("content length {length} exceeds the remaining {remaining} bytes")]
    LengthOverflow { length: usize, remaining: usize },
    #[error("indefinite length on primitive {0}")]
    IndefinitePrimitive(Tag),
    #[error("end-of-contents marker must have zero length")]
    InvalidEndOfContents,
    #[error("missing end-of-contents marker")]
    MissingEndOfContents,
    #[error("end-of-contents marker inside a definite-length encoding")]
    UnexpectedEndOfContents,
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("encoding larger than {0} bytes")]
    TooLarge(usize),
    #[error("{0} trailing bytes after the encoding")]
    TrailingData(usize),
    #[error("expected {expected}, got {actual}")]
    UnexpectedTag { expected: Tag, actual: Tag },
    #[error("{0} must be constructed")]
    ExpectedConstructed(Tag),
    #[error("invalid object identifier: {0}")]
    InvalidObjectIdentifier(String),
    #[error("invalid integer: {0}")]
    InvalidInteger(&'static str),
    #[error("invalid bit string: {0}")]
    InvalidBitString(&'static str),
    #[error("invalid string: {0}")]
    InvalidString(String),
    #[error("missing {0}")]
    MissingElement(&'static str),
    #[error("unexpected trailing elements in {0}")]
    TrailingElements(&'static str),
    #[error("pem: {0}")]
    Pem(#[from] kura_pem::error::Error),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match err {
            nom::Err::Incomplete(needed) => Error::ParserIncomplete(needed),
            nom::Err::Error(e) | nom::Err::Failure(e) => match e.code {
                nom::error::ErrorKind::Eof => Error::Truncated,
                code => Error::Parser(code),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
