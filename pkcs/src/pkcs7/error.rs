use kura_der::ObjectIdentifier;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported content type {0}")]
    UnsupportedContentType(ObjectIdentifier),

    #[error("invalid ContentInfo: {0}")]
    InvalidContentInfo(String),

    #[error("invalid SignedData: {0}")]
    InvalidSignedData(String),

    #[error("invalid SignerInfo: {0}")]
    InvalidSignerInfo(String),

    /// Neither the modern nor the legacy grammar accepted the input.
    #[error("PKCS#7 parsing failed (modern: {modern}; legacy: {legacy})")]
    Parsing { modern: Box<Error>, legacy: Box<Error> },

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signature mismatch: {0}")]
    SignatureMismatch(String),

    #[error("no certificate for signer {issuer} serial {serial}")]
    SignerNotFound { issuer: String, serial: String },

    /// Nothing to verify: no embedded content and no detached data.
    #[error("missing content")]
    MissingContent,

    #[error("DER error: {0}")]
    Der(#[from] kura_der::Error),

    #[error("certificate error: {0}")]
    Certificate(#[from] kura_x509::Error),

    #[error("PKCS#9 attribute error: {0}")]
    Pkcs9(#[from] crate::pkcs9::Error),

    #[error("crypto error: {0}")]
    Crypto(kura_crypto::Error),
}

impl From<kura_crypto::Error> for Error {
    fn from(err: kura_crypto::Error) -> Self {
        match err {
            kura_crypto::Error::UnsupportedAlgorithm(alg) => Error::UnsupportedAlgorithm(alg),
            kura_crypto::Error::SignatureMismatch => {
                Error::SignatureMismatch("signature does not verify".into())
            }
            other => Error::Crypto(other),
        }
    }
}
