use std::fmt::Debug;

use chrono::{DateTime, NaiveDateTime, Utc};
use kura::decoder::{DecodableFrom, Decoder};
use kura_crypto::{SignatureAlgorithm, SignatureVerifier};
use kura_der::{Tag, Tlv};
use kura_pem::{FromPem, Label, Pem, ToPem};
use serde::{Serialize, Serializer};

use crate::algorithm::AlgorithmIdentifier;
use crate::error::{Error, Result};
use crate::name::Name;

/// What the container engines need from a certificate.
pub trait Certificate: Send + Sync + Debug {
    /// The encoding the certificate was decoded from.
    fn encoded(&self) -> &[u8];

    fn subject(&self) -> &Name;

    fn issuer(&self) -> &Name;

    /// Two's complement content of the serial number INTEGER.
    fn serial_number(&self) -> &[u8];

    /// DER SubjectPublicKeyInfo.
    fn public_key_info(&self) -> &[u8];

    fn signature_algorithm(&self) -> &AlgorithmIdentifier;

    /// Checks the certificate signature with the issuer key `public_key_info`.
    fn verify(&self, public_key_info: &[u8], verifier: &dyn SignatureVerifier) -> Result<()>;

    fn is_self_issued(&self) -> bool {
        self.subject() == self.issuer()
    }
}

/*
https://datatracker.ietf.org/doc/html/rfc5280#section-4.1

Certificate  ::=  SEQUENCE  {
    tbsCertificate       TBSCertificate,
    signatureAlgorithm   AlgorithmIdentifier,
    signatureValue       BIT STRING
}

TBSCertificate  ::=  SEQUENCE  {
     version         [0]  EXPLICIT Version DEFAULT v1,
     serialNumber         CertificateSerialNumber,
     signature            AlgorithmIdentifier,
     issuer               Name,
     validity             Validity,
     subject              Name,
     subjectPublicKeyInfo SubjectPublicKeyInfo,
     issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
     subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
     extensions      [3]  EXPLICIT Extensions OPTIONAL
}
 */

/// Structural view of an X.509 certificate. Extensions are kept only as
/// part of the encoding.
#[derive(Debug, Clone)]
pub struct X509Certificate {
    encoded: Vec<u8>,
    tbs_certificate: Vec<u8>,
    version: u8,
    serial_number: Vec<u8>,
    issuer: Name,
    validity: Validity,
    subject: Name,
    public_key_info: Vec<u8>,
    signature_algorithm: AlgorithmIdentifier,
    signature_value: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validity {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl X509Certificate {
    pub fn from_der(encoded: &[u8]) -> Result<Self> {
        let tlv = Tlv::from_bytes(encoded)?;
        let mut certificate: X509Certificate = tlv.decode()?;
        certificate.encoded = encoded.to_vec();
        Ok(certificate)
    }

    /// Version number, 1 to 3.
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn tbs_certificate(&self) -> &[u8] {
        &self.tbs_certificate
    }

    pub fn signature_value(&self) -> &[u8] {
        &self.signature_value
    }
}

impl Certificate for X509Certificate {
    fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    fn subject(&self) -> &Name {
        &self.subject
    }

    fn issuer(&self) -> &Name {
        &self.issuer
    }

    fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    fn public_key_info(&self) -> &[u8] {
        &self.public_key_info
    }

    fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    fn verify(&self, public_key_info: &[u8], verifier: &dyn SignatureVerifier) -> Result<()> {
        let oid = &self.signature_algorithm.algorithm;
        let algorithm = SignatureAlgorithm::from_oid(oid)
            .ok_or_else(|| Error::UnsupportedSignatureAlgorithm(oid.clone()))?;
        verifier.verify(
            algorithm,
            public_key_info,
            &self.tbs_certificate,
            &self.signature_value,
        )?;
        Ok(())
    }
}

/// UTCTime or GeneralizedTime in the `Z` form.
pub fn parse_time(tlv: &Tlv) -> Result<DateTime<Utc>> {
    let text = std::str::from_utf8(tlv.content())
        .map_err(|e| Error::InvalidValidity(e.to_string()))?;
    let full = match tlv.tag() {
        // RFC 5280: two-digit years 50..99 are 19xx
        Tag::UTC_TIME => {
            let yy: u32 = text
                .get(..2)
                .and_then(|yy| yy.parse().ok())
                .ok_or_else(|| Error::InvalidValidity(format!("bad UTCTime {text}")))?;
            let century = if yy >= 50 { "19" } else { "20" };
            format!("{century}{text}")
        }
        Tag::GENERALIZED_TIME => text.to_string(),
        other => {
            return Err(Error::InvalidValidity(format!("unexpected time tag {other}")));
        }
    };
    NaiveDateTime::parse_from_str(&full, "%Y%m%d%H%M%SZ")
        .map(|t| t.and_utc())
        .map_err(|e| Error::InvalidValidity(format!("{text}: {e}")))
}

impl DecodableFrom<Tlv> for Validity {}

impl Decoder<Tlv, Validity> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<Validity> {
        let [not_before, not_after] = self.as_sequence()? else {
            return Err(Error::InvalidValidity("expected two times".into()));
        };
        Ok(Validity {
            not_before: parse_time(not_before)?,
            not_after: parse_time(not_after)?,
        })
    }
}

impl DecodableFrom<Tlv> for X509Certificate {}

impl Decoder<Tlv, X509Certificate> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<X509Certificate> {
        let mut outer = self.sequence_reader("Certificate")?;
        let tbs = outer.read()?;
        let signature_algorithm: AlgorithmIdentifier = outer.read()?.decode()?;
        let signature_value = outer.read()?.as_bit_string()?.to_vec();
        outer.finish()?;

        let mut fields = tbs.sequence_reader("TBSCertificate")?;
        let version = match fields.read_optional(Tag::context(0, true)) {
            Some(version) => match version.explicit_inner(0)?.as_u64()? {
                v @ 0..=2 => v as u8 + 1,
                v => return Err(Error::InvalidVersion(v)),
            },
            None => 1,
        };
        let serial_number = fields.read()?.as_integer_content()?.to_vec();
        let signature: AlgorithmIdentifier = fields.read()?.decode()?;
        let issuer: Name = fields.read()?.decode()?;
        let validity: Validity = fields.read()?.decode()?;
        let subject: Name = fields.read()?.decode()?;
        let public_key_info = fields.read()?;
        public_key_info.as_sequence()?;

        if signature.algorithm != signature_algorithm.algorithm {
            return Err(Error::InvalidCertificate(format!(
                "signature algorithm mismatch: {} in TBS, {} outside",
                signature.algorithm, signature_algorithm.algorithm
            )));
        }

        Ok(X509Certificate {
            encoded: self.to_der(),
            tbs_certificate: tbs.to_der(),
            version,
            serial_number,
            issuer,
            validity,
            subject,
            public_key_info: public_key_info.to_der(),
            signature_algorithm,
            signature_value,
        })
    }
}

impl ToPem for X509Certificate {
    type Error = Error;

    fn pem_label(&self) -> Label {
        Label::Certificate
    }

    fn to_pem(&self) -> Result<Pem> {
        Ok(Pem::from_bytes(self.pem_label(), &self.encoded))
    }
}

impl FromPem for X509Certificate {
    type Error = Error;

    fn expected_label() -> Label {
        Label::Certificate
    }

    fn from_pem(pem: &Pem) -> Result<Self> {
        if *pem.label() != Self::expected_label() {
            return Err(Error::InvalidCertificate(format!(
                "unexpected PEM label {}",
                pem.label()
            )));
        }
        let der: Vec<u8> = pem.decode()?;
        Self::from_der(&der)
    }
}

impl Serialize for X509Certificate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Summary<'a> {
            version: u8,
            serial_number: String,
            signature_algorithm: String,
            issuer: String,
            validity: &'a Validity,
            subject: String,
        }

        Summary {
            version: self.version,
            serial_number: hex::encode(&self.serial_number),
            signature_algorithm: self.signature_algorithm.algorithm.to_string(),
            issuer: self.issuer.to_string(),
            validity: &self.validity,
            subject: self.subject.to_string(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use kura_der::{Tag, Tlv};
    use kura_pem::{FromPem, Pem, ToPem};
    use rstest::rstest;

    use super::{Certificate, X509Certificate, parse_time};
    use crate::error::Error;
    use crate::testing::CertificateBuilder;

    #[test]
    fn test_decode_built_certificate() {
        let der = CertificateBuilder::new("leaf").issuer("ca").serial(7).build_der();
        let cert = X509Certificate::from_der(&der).unwrap();
        assert_eq!(3, cert.version());
        assert_eq!("CN=leaf", cert.subject().to_string());
        assert_eq!("CN=ca", cert.issuer().to_string());
        assert_eq!(&[7], cert.serial_number());
        assert_eq!(der, cert.encoded());
        assert!(!cert.is_self_issued());
    }

    #[test]
    fn test_pem_round_trip() {
        let der = CertificateBuilder::new("root").build_der();
        let cert = X509Certificate::from_der(&der).unwrap();
        let pem = cert.to_pem().unwrap();
        let text = pem.to_string();
        let parsed = X509Certificate::from_pem(&text.parse::<Pem>().unwrap()).unwrap();
        assert_eq!(cert.encoded(), parsed.encoded());
        assert!(parsed.is_self_issued());
    }

    #[rstest(
        tag,
        text,
        expected,
        case(Tag::UTC_TIME, "491231235959Z", "2049-12-31T23:59:59+00:00"),
        case(Tag::UTC_TIME, "500101000000Z", "1950-01-01T00:00:00+00:00"),
        case(Tag::GENERALIZED_TIME, "20610101120000Z", "2061-01-01T12:00:00+00:00")
    )]
    fn test_parse_time(tag: Tag, text: &str, expected: &str) {
        let tlv = Tlv::primitive(tag, text.as_bytes().to_vec());
        assert_eq!(expected, parse_time(&tlv).unwrap().to_rfc3339());
    }

    #[test]
    fn test_trailing_fields_rejected() {
        let der = CertificateBuilder::new("leaf").build_der();
        let tlv = Tlv::from_bytes(&der).unwrap();
        let mut children = tlv.children().to_vec();
        children.push(Tlv::null());
        let broken = Tlv::sequence(children).to_der();
        assert!(matches!(
            X509Certificate::from_der(&broken),
            Err(Error::InvalidASN1(_))
        ));
    }

    #[test]
    fn test_serialize_summary() {
        let der = CertificateBuilder::new("leaf").issuer("ca").serial(258).build_der();
        let cert = X509Certificate::from_der(&der).unwrap();
        let json = serde_json::to_value(&cert).unwrap();
        assert_eq!("CN=leaf", json["subject"]);
        assert_eq!("0102", json["serial_number"]);
    }
}
