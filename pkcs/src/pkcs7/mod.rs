//! PKCS#7 SignedData (RFC 2315)
//!
//! Input is tried against the modern grammar first and against the
//! pre-standard one second; [`Pkcs7`] records which one matched. Output is
//! always written in the modern form.

pub mod content_info;
pub mod error;
pub mod signed_data;
pub mod signer_info;

use std::sync::Arc;

use kura::decoder::Decoder;
use kura_der::{Limits, Tlv};
use kura_pem::{FromPem, Label, Pem, ToPem};
use kura_x509::{Certificate, CertificateDecoder, X509Decoder};

pub use content_info::ContentInfo;
pub use error::{Error, Result};
pub use signed_data::SignedData;
pub use signer_info::SignerInfo;

use crate::oids;

/// A decoded PKCS#7 structure.
#[derive(Debug, Clone)]
pub enum Pkcs7 {
    ModernStyle(SignedData),
    /// Pre-standard layout, or the misspelled signedData identifier.
    LegacyStyle(SignedData),
    /// Netscape certificate sequence: certificates and nothing else.
    CertChainOnly(Vec<Arc<dyn Certificate>>),
}

impl Pkcs7 {
    /// Parses with the default certificate decoder.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with(bytes, &X509Decoder::new())
    }

    pub fn parse_with(bytes: &[u8], decoder: &dyn CertificateDecoder) -> Result<Self> {
        let tlv = Tlv::from_bytes_with_limits(bytes, &Limits::default())?;
        Self::from_tlv(&tlv, decoder)
    }

    /// Tries the modern grammar, then the legacy one on the same input.
    pub fn from_tlv(tlv: &Tlv, decoder: &dyn CertificateDecoder) -> Result<Self> {
        let modern = match Self::attempt(tlv, false, decoder) {
            Ok(pkcs7) => return Ok(pkcs7),
            Err(e) => e,
        };
        tracing::debug!(error = %modern, "modern PKCS#7 grammar failed, trying legacy");
        let legacy = match Self::attempt(tlv, true, decoder) {
            Ok(pkcs7) => return Ok(pkcs7),
            Err(e) => e,
        };
        match (modern, legacy) {
            (Error::UnsupportedContentType(oid), Error::UnsupportedContentType(_)) => {
                Err(Error::UnsupportedContentType(oid))
            }
            (modern, legacy) => Err(Error::Parsing {
                modern: Box::new(modern),
                legacy: Box::new(legacy),
            }),
        }
    }

    fn attempt(tlv: &Tlv, legacy: bool, decoder: &dyn CertificateDecoder) -> Result<Self> {
        let content_info: ContentInfo = if legacy {
            ContentInfo::decode_legacy(tlv)?
        } else {
            tlv.decode()?
        };
        let content_type = &content_info.content_type;
        let content = || {
            content_info.content.as_ref().ok_or_else(|| {
                Error::InvalidContentInfo(format!("{} without content", oids::describe(content_type)))
            })
        };

        if *content_type == oids::SIGNED_DATA && !legacy {
            Ok(Pkcs7::ModernStyle(SignedData::decode_modern(content()?, decoder)?))
        } else if *content_type == oids::SIGNED_DATA || *content_type == oids::LEGACY_SIGNED_DATA {
            Ok(Pkcs7::LegacyStyle(SignedData::decode_legacy(content()?, decoder)?))
        } else if *content_type == oids::NETSCAPE_CERT_SEQUENCE {
            let certificates =
                signed_data::decode_certificates(content()?.as_sequence()?, decoder)?;
            Ok(Pkcs7::CertChainOnly(certificates))
        } else {
            Err(Error::UnsupportedContentType(content_type.clone()))
        }
    }

    pub fn signed_data(&self) -> Option<&SignedData> {
        match self {
            Pkcs7::ModernStyle(signed_data) | Pkcs7::LegacyStyle(signed_data) => Some(signed_data),
            Pkcs7::CertChainOnly(_) => None,
        }
    }

    pub fn certificates(&self) -> &[Arc<dyn Certificate>] {
        match self {
            Pkcs7::ModernStyle(signed_data) | Pkcs7::LegacyStyle(signed_data) => {
                &signed_data.certificates
            }
            Pkcs7::CertChainOnly(certificates) => certificates,
        }
    }

    /// Modern DER encoding. A bare certificate chain becomes a
    /// certificate-only SignedData.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let content_info = match self {
            Pkcs7::ModernStyle(signed_data) | Pkcs7::LegacyStyle(signed_data) => {
                signed_data.to_content_info()?
            }
            Pkcs7::CertChainOnly(certificates) => {
                SignedData::degenerate(certificates.clone()).to_content_info()?
            }
        };
        Ok(content_info.to_tlv().to_der())
    }
}

impl ToPem for Pkcs7 {
    type Error = Error;

    fn pem_label(&self) -> Label {
        Label::Pkcs7
    }

    fn to_pem(&self) -> Result<Pem> {
        Ok(Pem::from_bytes(self.pem_label(), &self.to_der()?))
    }
}

impl FromPem for Pkcs7 {
    type Error = Error;

    fn expected_label() -> Label {
        Label::Pkcs7
    }

    fn from_pem(pem: &Pem) -> Result<Self> {
        if *pem.label() != Self::expected_label() {
            return Err(Error::InvalidContentInfo(format!(
                "unexpected PEM label {}",
                pem.label()
            )));
        }
        let der: Vec<u8> = pem.decode().map_err(kura_der::Error::from)?;
        Self::parse(&der)
    }
}
