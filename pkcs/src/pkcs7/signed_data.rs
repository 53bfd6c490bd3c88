use std::sync::Arc;

use kura::decoder::Decoder;
use kura_crypto::{DigestAlgorithm, Primitives, SignatureAlgorithm};
use kura_der::{Tag, Tlv};
use kura_x509::{AlgorithmIdentifier, Certificate, CertificateDecoder};

use crate::oids;
use crate::pkcs7::content_info::ContentInfo;
use crate::pkcs7::error::{Error, Result};
use crate::pkcs7::signer_info::SignerInfo;
use crate::pkcs9::attribute::{ContentType, MessageDigest};

/*
https://datatracker.ietf.org/doc/html/rfc2315#section-9.1

SignedData ::= SEQUENCE {
    version Version,
    digestAlgorithms DigestAlgorithmIdentifiers,
    contentInfo ContentInfo,
    certificates [0] IMPLICIT ExtendedCertificatesAndCertificates OPTIONAL,
    crls [1] IMPLICIT CertificateRevocationLists OPTIONAL,
    signerInfos SignerInfos
}

DigestAlgorithmIdentifiers ::= SET OF DigestAlgorithmIdentifier

SignerInfos ::= SET OF SignerInfo
 */

#[derive(Debug, Clone)]
pub struct SignedData {
    pub version: u64,
    pub digest_algorithms: Vec<AlgorithmIdentifier>,
    pub content_info: ContentInfo,
    pub certificates: Vec<Arc<dyn Certificate>>,
    /// Revocation lists are carried but not interpreted.
    pub crls: Vec<Tlv>,
    pub signer_infos: Vec<SignerInfo>,
}

impl SignedData {
    /// Certificate-only SignedData: no digest algorithms, empty `data`
    /// content, no signers.
    pub fn degenerate(certificates: Vec<Arc<dyn Certificate>>) -> Self {
        SignedData {
            version: 1,
            digest_algorithms: Vec::new(),
            content_info: ContentInfo::empty_data(),
            certificates,
            crls: Vec::new(),
            signer_infos: Vec::new(),
        }
    }

    pub fn decode_modern(tlv: &Tlv, decoder: &dyn CertificateDecoder) -> Result<Self> {
        let mut reader = tlv.sequence_reader("SignedData")?;
        let version = reader.read()?.as_u64()?;
        let digest_algorithms = decode_digest_algorithms(reader.read()?)?;
        let content_info: ContentInfo = reader.read()?.decode()?;
        let certificates = match reader.read_optional(Tag::context(0, true)) {
            Some(set) => decode_certificates(set.children(), decoder)?,
            None => Vec::new(),
        };
        let crls = reader
            .read_optional(Tag::context(1, true))
            .map(|set| set.children().to_vec())
            .unwrap_or_default();
        let signer_infos = reader
            .read()?
            .as_set()?
            .iter()
            .map(|info| info.decode())
            .collect::<Result<Vec<SignerInfo>>>()?;
        reader.finish()?;
        tracing::debug!(
            certificates = certificates.len(),
            signers = signer_infos.len(),
            "decoded SignedData"
        );
        Ok(SignedData {
            version,
            digest_algorithms,
            content_info,
            certificates,
            crls,
            signer_infos,
        })
    }

    /// The pre-standard layout: unwrapped content, certificates as a
    /// universal SET, an optional revocation list SET which is ignored,
    /// and signer infos without attributes.
    pub fn decode_legacy(tlv: &Tlv, decoder: &dyn CertificateDecoder) -> Result<Self> {
        let mut reader = tlv.sequence_reader("SignedData")?;
        let version = reader.read()?.as_u64()?;
        let digest_algorithms = decode_digest_algorithms(reader.read()?)?;
        let content_info = ContentInfo::decode_legacy(reader.read()?)?;
        let (certificates, signer_infos) = match reader.remaining() {
            1 => (None, reader.read()?),
            2 => (Some(reader.read()?), reader.read()?),
            3 => {
                let certificates = reader.read()?;
                reader.read()?.as_set()?;
                (Some(certificates), reader.read()?)
            }
            n => {
                return Err(Error::InvalidSignedData(format!(
                    "legacy SignedData with {n} trailing elements"
                )));
            }
        };
        let certificates = match certificates {
            Some(set) => decode_certificates(set.as_set()?, decoder)?,
            None => Vec::new(),
        };
        let signer_infos = signer_infos
            .as_set()?
            .iter()
            .map(SignerInfo::decode_legacy)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            certificates = certificates.len(),
            signers = signer_infos.len(),
            "decoded legacy SignedData"
        );
        Ok(SignedData {
            version,
            digest_algorithms,
            content_info,
            certificates,
            crls: Vec::new(),
            signer_infos,
        })
    }

    /// Modern encoding with canonical SET orders.
    pub fn to_tlv(&self) -> Result<Tlv> {
        let mut children = vec![
            Tlv::small_integer(self.version),
            Tlv::set_of(self.digest_algorithms.iter().map(AlgorithmIdentifier::to_tlv).collect()),
            self.content_info.to_tlv(),
        ];
        if !self.certificates.is_empty() {
            children.push(certificate_set(&self.certificates)?.implicit(0));
        }
        if !self.crls.is_empty() {
            children.push(Tlv::set_of(self.crls.clone()).implicit(1));
        }
        children.push(Tlv::set_of(self.signer_infos.iter().map(SignerInfo::to_tlv).collect()));
        Ok(Tlv::sequence(children))
    }

    /// This SignedData wrapped in a ContentInfo.
    pub fn to_content_info(&self) -> Result<ContentInfo> {
        Ok(ContentInfo::new(oids::SIGNED_DATA, Some(self.to_tlv()?)))
    }

    /// The certificate named by a signer's issuer and serial number.
    pub fn signer_certificate(&self, signer: &SignerInfo) -> Result<&Arc<dyn Certificate>> {
        self.certificates
            .iter()
            .find(|certificate| signer.identifies(certificate.as_ref()))
            .ok_or_else(|| Error::SignerNotFound {
                issuer: signer.issuer.to_string(),
                serial: hex::encode(&signer.serial_number),
            })
    }

    /// Verifies one signer over the embedded content, or over `detached`
    /// when given. Returns the signer certificate.
    pub fn verify(
        &self,
        signer: &SignerInfo,
        detached: Option<&[u8]>,
        primitives: &Primitives,
    ) -> Result<Arc<dyn Certificate>> {
        let content = match detached {
            Some(data) => data.to_vec(),
            None => self.content_info.content_bytes()?.ok_or(Error::MissingContent)?,
        };
        let certificate = self.signer_certificate(signer)?;

        let digest_oid = &signer.digest_algorithm.algorithm;
        let digest_algorithm = DigestAlgorithm::from_oid(digest_oid)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest {digest_oid}")))?;
        let encryption_oid = &signer.digest_encryption_algorithm.algorithm;
        let algorithm = SignatureAlgorithm::from_parts(digest_algorithm, encryption_oid)
            .ok_or_else(|| {
                Error::UnsupportedAlgorithm(format!("signature {encryption_oid}"))
            })?;

        let signed = match &signer.authenticated_attributes {
            None => content,
            Some(attributes) => {
                let content_type: ContentType = attributes.attribute()?.ok_or_else(|| {
                    Error::SignatureMismatch("missing contentType attribute".into())
                })?;
                if *content_type.content_type() != self.content_info.content_type {
                    return Err(Error::SignatureMismatch(format!(
                        "contentType attribute {content_type} does not match content {}",
                        oids::describe(&self.content_info.content_type)
                    )));
                }
                let message_digest: MessageDigest = attributes.attribute()?.ok_or_else(|| {
                    Error::SignatureMismatch("missing messageDigest attribute".into())
                })?;
                let computed = primitives.digest.digest(digest_algorithm, &content)?;
                if computed != message_digest.digest() {
                    return Err(Error::SignatureMismatch(
                        "messageDigest does not match the content".into(),
                    ));
                }
                attributes.to_set_der()
            }
        };

        primitives.verifier.verify(
            algorithm,
            certificate.public_key_info(),
            &signed,
            &signer.encrypted_digest,
        )?;
        tracing::debug!(signer = %certificate.subject(), %algorithm, "signature verified");
        Ok(certificate.clone())
    }

    /// Verifies every signer. Fails on the first signer that does not
    /// verify, and when there is no signer at all.
    pub fn verify_all(
        &self,
        detached: Option<&[u8]>,
        primitives: &Primitives,
    ) -> Result<Vec<Arc<dyn Certificate>>> {
        if self.signer_infos.is_empty() {
            return Err(Error::InvalidSignedData("no signer infos to verify".into()));
        }
        self.signer_infos
            .iter()
            .map(|signer| self.verify(signer, detached, primitives))
            .collect()
    }
}

fn decode_digest_algorithms(set: &Tlv) -> Result<Vec<AlgorithmIdentifier>> {
    set.as_set()?
        .iter()
        .map(|alg| {
            let alg: AlgorithmIdentifier = alg.decode()?;
            Ok(alg)
        })
        .collect()
}

pub(crate) fn decode_certificates(
    items: &[Tlv],
    decoder: &dyn CertificateDecoder,
) -> Result<Vec<Arc<dyn Certificate>>> {
    items
        .iter()
        .map(|item| {
            if item.tag() != Tag::SEQUENCE {
                return Err(Error::InvalidSignedData(format!(
                    "unsupported certificate choice {}",
                    item.tag()
                )));
            }
            Ok(decoder.decode_certificate(&item.to_der())?)
        })
        .collect()
}

/// Canonical SET OF the certificates, each in its original encoding.
pub(crate) fn certificate_set(certificates: &[Arc<dyn Certificate>]) -> Result<Tlv> {
    let encoded = certificates
        .iter()
        .map(|certificate| Tlv::from_bytes(certificate.encoded()))
        .collect::<kura_der::Result<Vec<_>>>()?;
    Ok(Tlv::set_of(encoded))
}
