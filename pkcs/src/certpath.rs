//! Certification paths as PkiPath or PKCS#7 encodings.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use kura_der::block::read_one_block;
use kura_der::{Limits, Tlv};
use kura_x509::{Certificate, CertificateDecoder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pkcs7::{Pkcs7, SignedData};

/*
PkiPath ::= SEQUENCE OF Certificate
    -- trust anchor first, target last
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CertPathEncoding {
    #[default]
    PkiPath,
    Pkcs7,
}

impl Display for CertPathEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CertPathEncoding::PkiPath => write!(f, "PkiPath"),
            CertPathEncoding::Pkcs7 => write!(f, "PKCS7"),
        }
    }
}

impl FromStr for CertPathEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PkiPath" => Ok(CertPathEncoding::PkiPath),
            "PKCS7" => Ok(CertPathEncoding::Pkcs7),
            other => Err(Error::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// An ordered certificate path, target (leaf) first.
#[derive(Debug, Clone, Default)]
pub struct CertPath {
    certificates: Vec<Arc<dyn Certificate>>,
}

impl CertPath {
    pub fn new(certificates: Vec<Arc<dyn Certificate>>) -> Self {
        CertPath { certificates }
    }

    /// Supported encodings, the default first.
    pub fn encodings() -> &'static [CertPathEncoding] {
        &[CertPathEncoding::PkiPath, CertPathEncoding::Pkcs7]
    }

    pub fn certificates(&self) -> &[Arc<dyn Certificate>] {
        &self.certificates
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn encode(&self, encoding: CertPathEncoding) -> Result<Vec<u8>> {
        match encoding {
            CertPathEncoding::PkiPath => {
                let mut seen = HashSet::new();
                let mut children = Vec::with_capacity(self.certificates.len());
                for certificate in self.certificates.iter().rev() {
                    if !seen.insert(certificate.encoded()) {
                        return Err(Error::DuplicateCertificate(certificate.subject().to_string()));
                    }
                    children.push(Tlv::from_bytes(certificate.encoded())?);
                }
                Ok(Tlv::sequence(children).to_der())
            }
            CertPathEncoding::Pkcs7 => {
                let signed_data = SignedData::degenerate(self.certificates.clone());
                Ok(signed_data.to_content_info()?.to_tlv().to_der())
            }
        }
    }

    pub fn decode(
        bytes: &[u8],
        encoding: CertPathEncoding,
        decoder: &dyn CertificateDecoder,
    ) -> Result<Self> {
        let certificates = match encoding {
            CertPathEncoding::PkiPath => {
                let path = Tlv::from_bytes_with_limits(bytes, &Limits::default())?;
                let mut certificates = path
                    .as_sequence()?
                    .iter()
                    .map(|certificate| decoder.decode_certificate(&certificate.to_der()))
                    .collect::<kura_x509::Result<Vec<_>>>()?;
                certificates.reverse();
                certificates
            }
            CertPathEncoding::Pkcs7 => {
                let pkcs7 = Pkcs7::parse_with(bytes, decoder)?;
                leaf_first(pkcs7.certificates().to_vec())
            }
        };
        tracing::debug!(%encoding, certificates = certificates.len(), "decoded certificate path");
        Ok(CertPath { certificates })
    }

    /// Reads one DER or PEM block. An empty stream gives an empty path.
    pub fn read<R: Read>(
        reader: &mut R,
        encoding: CertPathEncoding,
        decoder: &dyn CertificateDecoder,
    ) -> Result<Self> {
        match read_one_block(reader)? {
            Some(bytes) => Self::decode(&bytes, encoding, decoder),
            None => Ok(CertPath::default()),
        }
    }
}

/// Re-links certificates from an unordered SET by issuer and subject. The
/// input order is kept when no single linked path covers all of them.
fn leaf_first(certificates: Vec<Arc<dyn Certificate>>) -> Vec<Arc<dyn Certificate>> {
    if certificates.len() < 2 {
        return certificates;
    }
    let issues_another = |candidate: &Arc<dyn Certificate>| {
        certificates.iter().any(|other| {
            other.encoded() != candidate.encoded() && other.issuer() == candidate.subject()
        })
    };
    let leaves: Vec<_> = certificates.iter().filter(|c| !issues_another(*c)).collect();
    let [leaf] = leaves.as_slice() else {
        tracing::debug!(leaves = leaves.len(), "no single leaf, keeping input order");
        return certificates;
    };

    let mut path = vec![Arc::clone(leaf)];
    let mut current = Arc::clone(leaf);
    while path.len() < certificates.len() && !current.is_self_issued() {
        let Some(issuer) = certificates.iter().find(|c| {
            c.subject() == current.issuer() && !path.iter().any(|p| p.encoded() == c.encoded())
        }) else {
            break;
        };
        path.push(Arc::clone(issuer));
        current = Arc::clone(issuer);
    }
    if path.len() == certificates.len() {
        path
    } else {
        tracing::debug!("certificates do not form one path, keeping input order");
        certificates
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use kura_der::Tlv;
    use kura_x509::testing::{CertificateBuilder, chain};
    use kura_x509::{Certificate, CertificateDecoder, X509Decoder};
    use rstest::rstest;

    use super::{CertPath, CertPathEncoding};
    use crate::error::Error;

    fn decode(ders: &[Vec<u8>]) -> Vec<Arc<dyn Certificate>> {
        let decoder = X509Decoder::new();
        ders.iter()
            .map(|der| decoder.decode_certificate(der).unwrap())
            .collect()
    }

    fn subjects(path: &CertPath) -> Vec<String> {
        path.certificates()
            .iter()
            .map(|c| c.subject().to_string())
            .collect()
    }

    #[test]
    fn test_pki_path_order() {
        let ders = chain(&["leaf", "intermediate", "root"]);
        let path = CertPath::new(decode(&ders));
        let encoded = path.encode(CertPathEncoding::PkiPath).unwrap();

        let tlv = Tlv::from_bytes(&encoded).unwrap();
        let order: Vec<Vec<u8>> = tlv.children().iter().map(Tlv::to_der).collect();
        assert_eq!(vec![ders[2].clone(), ders[1].clone(), ders[0].clone()], order);

        let decoded =
            CertPath::decode(&encoded, CertPathEncoding::PkiPath, &X509Decoder::new()).unwrap();
        assert_eq!(
            vec!["CN=leaf", "CN=intermediate", "CN=root"],
            subjects(&decoded)
        );
    }

    #[rstest]
    #[case::three(&["leaf", "intermediate", "root"])]
    #[case::two(&["leaf", "root"])]
    #[case::single(&["root"])]
    fn test_pkcs7_restores_leaf_first(#[case] names: &[&str]) {
        let path = CertPath::new(decode(&chain(names)));
        let encoded = path.encode(CertPathEncoding::Pkcs7).unwrap();
        let decoded =
            CertPath::decode(&encoded, CertPathEncoding::Pkcs7, &X509Decoder::new()).unwrap();
        let expected: Vec<String> = names.iter().map(|n| format!("CN={n}")).collect();
        assert_eq!(expected, subjects(&decoded));
    }

    #[test]
    fn test_pkcs7_unrelated_certificates_keep_order() {
        let ders = vec![
            CertificateBuilder::new("b").serial(2).build_der(),
            CertificateBuilder::new("a").serial(1).build_der(),
        ];
        let path = CertPath::new(decode(&ders));
        let encoded = path.encode(CertPathEncoding::Pkcs7).unwrap();
        let decoded =
            CertPath::decode(&encoded, CertPathEncoding::Pkcs7, &X509Decoder::new()).unwrap();
        assert_eq!(2, decoded.len());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut certificates = decode(&chain(&["leaf", "root"]));
        certificates.push(certificates[1].clone());
        assert!(matches!(
            CertPath::new(certificates).encode(CertPathEncoding::PkiPath),
            Err(Error::DuplicateCertificate(_))
        ));
    }

    #[test]
    fn test_encodings() {
        assert_eq!(
            &[CertPathEncoding::PkiPath, CertPathEncoding::Pkcs7],
            CertPath::encodings()
        );
        assert_eq!(CertPathEncoding::PkiPath, CertPathEncoding::default());
        for encoding in CertPath::encodings() {
            assert_eq!(*encoding, CertPathEncoding::from_str(&encoding.to_string()).unwrap());
        }
        assert!(matches!(
            CertPathEncoding::from_str("PEM"),
            Err(Error::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_read_pem() {
        let ders = chain(&["leaf", "root"]);
        let encoded = CertPath::new(decode(&ders))
            .encode(CertPathEncoding::Pkcs7)
            .unwrap();
        let pem = kura_pem::Pem::from_bytes(kura_pem::Label::Pkcs7, &encoded).to_string();
        let path = CertPath::read(
            &mut pem.as_bytes(),
            CertPathEncoding::Pkcs7,
            &X509Decoder::new(),
        )
        .unwrap();
        assert_eq!(vec!["CN=leaf", "CN=root"], subjects(&path));

        let empty = CertPath::read(&mut &b""[..], CertPathEncoding::PkiPath, &X509Decoder::new())
            .unwrap();
        assert!(empty.is_empty());
    }
}
