//! Structurally valid certificates for tests.
//!
//! The signature is a fixed placeholder unless a signing closure is given,
//! so only the structure and the names are meaningful.

use kura_der::{ObjectIdentifier, Tag, Tlv};

use crate::algorithm::AlgorithmIdentifier;
use crate::name::{COMMON_NAME, Name};

const ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::from_static(&[1, 2, 840, 10045, 4, 3, 2]);
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 2, 1]);
const PRIME256V1: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 3, 1, 7]);

type Signer = Box<dyn Fn(&[u8]) -> Vec<u8>>;

pub struct CertificateBuilder {
    subject: Name,
    issuer: Name,
    serial: u64,
    public_key_info: Option<Vec<u8>>,
    signer: Option<Signer>,
}

impl CertificateBuilder {
    /// Self-issued certificate for `CN=<common_name>`.
    pub fn new(common_name: &str) -> Self {
        let subject = Name::from_attributes(&[(COMMON_NAME, common_name)]);
        CertificateBuilder {
            issuer: subject.clone(),
            subject,
            serial: 1,
            public_key_info: None,
            signer: None,
        }
    }

    pub fn issuer(mut self, common_name: &str) -> Self {
        self.issuer = Name::from_attributes(&[(COMMON_NAME, common_name)]);
        self
    }

    pub fn issuer_name(mut self, issuer: Name) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn serial(mut self, serial: u64) -> Self {
        self.serial = serial;
        self
    }

    /// DER SubjectPublicKeyInfo. Defaults to a P-256 point derived from
    /// the serial number, which is well formed but not on the curve.
    pub fn public_key_info(mut self, der: Vec<u8>) -> Self {
        self.public_key_info = Some(der);
        self
    }

    /// Closure producing the DER ECDSA-with-SHA256 signature over the TBS
    /// encoding.
    pub fn signer(mut self, sign: impl Fn(&[u8]) -> Vec<u8> + 'static) -> Self {
        self.signer = Some(Box::new(sign));
        self
    }

    pub fn build_der(&self) -> Vec<u8> {
        let public_key_info = match &self.public_key_info {
            Some(der) => Tlv::from_bytes(der).unwrap_or_else(|_| Tlv::octet_string(der)),
            None => {
                let mut point = vec![0x04];
                point.extend(self.serial.to_be_bytes().repeat(8));
                Tlv::sequence(vec![
                    AlgorithmIdentifier::new(EC_PUBLIC_KEY, Some(Tlv::object_identifier(&PRIME256V1)))
                        .to_tlv(),
                    Tlv::bit_string(&point),
                ])
            }
        };
        let algorithm = AlgorithmIdentifier::new(ECDSA_WITH_SHA256, None).to_tlv();
        let validity = Tlv::sequence(vec![
            Tlv::primitive(Tag::UTC_TIME, b"240101000000Z".to_vec()),
            Tlv::primitive(Tag::GENERALIZED_TIME, b"20540101000000Z".to_vec()),
        ]);
        let tbs = Tlv::sequence(vec![
            Tlv::explicit(0, Tlv::small_integer(2)),
            Tlv::small_integer(self.serial),
            algorithm.clone(),
            self.issuer.as_tlv().clone(),
            validity,
            self.subject.as_tlv().clone(),
            public_key_info,
        ]);
        let signature = match &self.signer {
            Some(sign) => sign(&tbs.to_der()),
            None => vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01],
        };
        Tlv::sequence(vec![tbs, algorithm, Tlv::bit_string(&signature)]).to_der()
    }
}

/// Linked chain, leaf first: `names[i]` is issued by `names[i + 1]` and the
/// last name is self-issued.
pub fn chain(names: &[&str]) -> Vec<Vec<u8>> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let issuer = names.get(i + 1).unwrap_or(name);
            CertificateBuilder::new(name)
                .issuer(issuer)
                .serial(i as u64 + 1)
                .build_der()
        })
        .collect()
}
