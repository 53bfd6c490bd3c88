use kura_der::ObjectIdentifier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error("invalid TBS certificate: {0}")]
    InvalidTBSCertificate(String),
    #[error("invalid version: {0}")]
    InvalidVersion(u64),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid algorithm identifier: {0}")]
    InvalidAlgorithmIdentifier(String),
    #[error("invalid validity: {0}")]
    InvalidValidity(String),
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedSignatureAlgorithm(ObjectIdentifier),
    #[error("invalid ASN.1: {0}")]
    InvalidASN1(#[from] kura_der::Error),
    #[error("pem: {0}")]
    Pem(#[from] kura_pem::error::Error),
    #[error("signature verification: {0}")]
    Verification(#[from] kura_crypto::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
