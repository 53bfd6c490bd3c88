use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};
use kura_der::{Tag, Tlv};
use kura_x509::{AlgorithmIdentifier, Certificate, Name};

use crate::pkcs7::error::{Error, Result};
use crate::pkcs9::Pkcs9Attributes;

/*
https://datatracker.ietf.org/doc/html/rfc2315#section-9.2

SignerInfo ::= SEQUENCE {
    version Version,
    issuerAndSerialNumber IssuerAndSerialNumber,
    digestAlgorithm DigestAlgorithmIdentifier,
    authenticatedAttributes [0] IMPLICIT Attributes OPTIONAL,
    digestEncryptionAlgorithm DigestEncryptionAlgorithmIdentifier,
    encryptedDigest EncryptedDigest,
    unauthenticatedAttributes [1] IMPLICIT Attributes OPTIONAL
}

IssuerAndSerialNumber ::= SEQUENCE {
    issuer Name,
    serialNumber CertificateSerialNumber
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerInfo {
    pub version: u64,
    pub issuer: Name,
    /// Two's complement content of the serial number INTEGER.
    pub serial_number: Vec<u8>,
    pub digest_algorithm: AlgorithmIdentifier,
    pub authenticated_attributes: Option<Pkcs9Attributes>,
    pub digest_encryption_algorithm: AlgorithmIdentifier,
    pub encrypted_digest: Vec<u8>,
    pub unauthenticated_attributes: Option<Pkcs9Attributes>,
}

impl SignerInfo {
    /// Whether `certificate` is the one named by the issuer and serial
    /// number of this signer.
    pub fn identifies(&self, certificate: &dyn Certificate) -> bool {
        *certificate.issuer() == self.issuer && certificate.serial_number() == self.serial_number
    }

    /// Legacy signer infos carry no attributes. Old encoders still wrote
    /// empty universal SETs in the attribute positions.
    pub fn decode_legacy(tlv: &Tlv) -> Result<Self> {
        let mut reader = tlv.sequence_reader("SignerInfo")?;
        let version = reader.read()?.as_u64()?;
        let (issuer, serial_number) = decode_issuer_and_serial(reader.read()?)?;
        let digest_algorithm: AlgorithmIdentifier = reader.read()?.decode()?;
        skip_empty_set(reader.read_optional(Tag::SET))?;
        let digest_encryption_algorithm: AlgorithmIdentifier = reader.read()?.decode()?;
        let encrypted_digest = reader.read()?.as_octet_string()?;
        skip_empty_set(reader.read_optional(Tag::SET))?;
        reader.finish()?;
        Ok(SignerInfo {
            version,
            issuer,
            serial_number,
            digest_algorithm,
            authenticated_attributes: None,
            digest_encryption_algorithm,
            encrypted_digest,
            unauthenticated_attributes: None,
        })
    }

    pub fn to_tlv(&self) -> Tlv {
        let mut children = vec![
            Tlv::small_integer(self.version),
            Tlv::sequence(vec![
                self.issuer.as_tlv().clone(),
                Tlv::integer_from_content(&self.serial_number),
            ]),
            self.digest_algorithm.to_tlv(),
        ];
        if let Some(attributes) = &self.authenticated_attributes {
            children.push(attributes.to_implicit(0));
        }
        children.push(self.digest_encryption_algorithm.to_tlv());
        children.push(Tlv::octet_string(&self.encrypted_digest));
        if let Some(attributes) = &self.unauthenticated_attributes {
            children.push(attributes.to_implicit(1));
        }
        Tlv::sequence(children)
    }
}

fn decode_issuer_and_serial(tlv: &Tlv) -> Result<(Name, Vec<u8>)> {
    let [issuer, serial] = tlv.as_sequence()? else {
        return Err(Error::InvalidSignerInfo(
            "IssuerAndSerialNumber must have 2 elements".into(),
        ));
    };
    let issuer: Name = issuer.decode()?;
    Ok((issuer, serial.as_integer_content()?.to_vec()))
}

fn skip_empty_set(set: Option<&Tlv>) -> Result<()> {
    match set {
        Some(set) if !set.children().is_empty() => Err(Error::InvalidSignerInfo(
            "legacy signer info with attributes".into(),
        )),
        _ => Ok(()),
    }
}

impl DecodableFrom<Tlv> for SignerInfo {}

impl Decoder<Tlv, SignerInfo> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<SignerInfo> {
        let mut reader = self.sequence_reader("SignerInfo")?;
        let version = reader.read()?.as_u64()?;
        let (issuer, serial_number) = decode_issuer_and_serial(reader.read()?)?;
        let digest_algorithm: AlgorithmIdentifier = reader.read()?.decode()?;
        let authenticated_attributes = reader
            .read_optional(Tag::context(0, true))
            .map(|set| Pkcs9Attributes::decode(set, true))
            .transpose()?;
        let digest_encryption_algorithm: AlgorithmIdentifier = reader.read()?.decode()?;
        let encrypted_digest = reader.read()?.as_octet_string()?;
        let unauthenticated_attributes = reader
            .read_optional(Tag::context(1, true))
            .map(|set| Pkcs9Attributes::decode(set, true))
            .transpose()?;
        reader.finish()?;
        Ok(SignerInfo {
            version,
            issuer,
            serial_number,
            digest_algorithm,
            authenticated_attributes,
            digest_encryption_algorithm,
            encrypted_digest,
            unauthenticated_attributes,
        })
    }
}

impl EncodableTo<SignerInfo> for Tlv {}

impl Encoder<SignerInfo, Tlv> for SignerInfo {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(self.to_tlv())
    }
}

#[cfg(test)]
mod tests {
    use kura::decoder::Decoder;
    use kura_crypto::DigestAlgorithm;
    use kura_der::{Tag, Tlv};
    use kura_x509::name::COMMON_NAME;
    use kura_x509::{AlgorithmIdentifier, Name};

    use super::SignerInfo;
    use crate::oids;
    use crate::pkcs7::error::Error;
    use crate::pkcs9::Pkcs9Attributes;
    use crate::pkcs9::attribute::{Attribute, ContentType};

    fn signer(authenticated: bool) -> SignerInfo {
        let attributes = authenticated.then(|| {
            Pkcs9Attributes::new(vec![ContentType::new(oids::DATA).to_raw()]).unwrap()
        });
        SignerInfo {
            version: 1,
            issuer: Name::from_attributes(&[(COMMON_NAME, "ca")]),
            serial_number: vec![0x01, 0x02],
            digest_algorithm: AlgorithmIdentifier::new(DigestAlgorithm::Sha256.oid(), None),
            authenticated_attributes: attributes,
            digest_encryption_algorithm: AlgorithmIdentifier::new(
                DigestAlgorithm::Sha256.oid(),
                None,
            ),
            encrypted_digest: vec![0xaa; 8],
            unauthenticated_attributes: None,
        }
    }

    #[test]
    fn test_signer_info_round_trip() {
        for authenticated in [false, true] {
            let info = signer(authenticated);
            let tlv = info.to_tlv();
            let decoded: SignerInfo = tlv.decode().unwrap();
            assert_eq!(tlv, decoded.to_tlv());
            assert_eq!(authenticated, decoded.authenticated_attributes.is_some());
        }
    }

    #[test]
    fn test_legacy_signer_info_with_empty_sets() {
        let modern = signer(false).to_tlv();
        let mut children = modern.children().to_vec();
        children.insert(3, Tlv::set_of(vec![]));
        children.push(Tlv::set_of(vec![]));
        let legacy = Tlv::sequence(children);
        let decoded = SignerInfo::decode_legacy(&legacy).unwrap();
        assert_eq!(signer(false), decoded);
    }

    #[test]
    fn test_legacy_signer_info_rejects_attributes() {
        let modern = signer(false).to_tlv();
        let mut children = modern.children().to_vec();
        children.insert(3, Tlv::set_of(vec![Tlv::null()]));
        let legacy = Tlv::sequence(children);
        assert!(matches!(
            SignerInfo::decode_legacy(&legacy),
            Err(Error::InvalidSignerInfo(_))
        ));
    }

    #[test]
    fn test_authenticated_attributes_keep_implicit_tag() {
        let tlv = signer(true).to_tlv();
        assert_eq!(Tag::context(0, true), tlv.children()[3].tag());
    }
}
