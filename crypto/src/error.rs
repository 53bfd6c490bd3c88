use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid key length {length} for {algorithm}")]
    InvalidKeyLength { algorithm: String, length: usize },
    #[error("invalid IV length {length} for {algorithm}")]
    InvalidIvLength { algorithm: String, length: usize },
    /// Decryption produced invalid padding, usually a wrong key.
    #[error("bad padding")]
    BadPadding,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("random source failure: {0}")]
    Random(String),
}

pub type Result<T> = std::result::Result<T, Error>;
