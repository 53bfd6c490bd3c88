use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};
use kura_crypto::Primitives;
use kura_der::{Limits, ObjectIdentifier, Tag, Tlv};
use kura_x509::AlgorithmIdentifier;

use super::error::{Error, Result};
use super::mac::MacData;
use crate::oids;
use crate::pbe::PbeScheme;
use crate::pkcs7::ContentInfo;

/*
https://datatracker.ietf.org/doc/html/rfc7292#section-4

PFX ::= SEQUENCE {
    version     INTEGER {v3(3)}(v3,...),
    authSafe    ContentInfo,
    macData     MacData OPTIONAL
}

AuthenticatedSafe ::= SEQUENCE OF ContentInfo
    -- Data if unencrypted
    -- EncryptedData if password-encrypted
 */

pub const VERSION: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pfx {
    /// The AuthenticatedSafe encoding, exactly the bytes covered by the MAC.
    pub auth_safe: Vec<u8>,
    pub mac_data: Option<MacData>,
}

impl Pfx {
    pub fn from_der(bytes: &[u8], limits: &Limits) -> Result<Self> {
        Tlv::from_bytes_with_limits(bytes, limits)?.decode()
    }

    pub fn to_tlv(&self) -> Tlv {
        let mut fields = vec![
            Tlv::small_integer(VERSION),
            ContentInfo::data(&self.auth_safe).to_tlv(),
        ];
        if let Some(mac_data) = &self.mac_data {
            fields.push(mac_data.to_tlv());
        }
        Tlv::sequence(fields)
    }

    pub fn to_der(&self) -> Vec<u8> {
        self.to_tlv().to_der()
    }

    /// The ContentInfos of the AuthenticatedSafe.
    pub fn contents(&self, limits: &Limits) -> Result<Vec<ContentInfo>> {
        let safe = Tlv::from_bytes_with_limits(&self.auth_safe, limits)?;
        safe.as_sequence()?
            .iter()
            .map(|info| {
                let info: ContentInfo = info.decode()?;
                Ok(info)
            })
            .collect()
    }
}

pub fn encode_authenticated_safe(contents: &[ContentInfo]) -> Vec<u8> {
    Tlv::sequence(contents.iter().map(ContentInfo::to_tlv).collect()).to_der()
}

impl DecodableFrom<Tlv> for Pfx {}

impl Decoder<Tlv, Pfx> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<Pfx> {
        let mut reader = self.sequence_reader("PFX")?;
        let version = reader.read()?.as_u64()?;
        if version != VERSION {
            return Err(Error::InvalidVersion(version));
        }
        let auth_safe: ContentInfo = reader.read()?.decode()?;
        if auth_safe.content_type != oids::DATA {
            return Err(Error::UnsupportedContentType(auth_safe.content_type));
        }
        let auth_safe = auth_safe
            .content_bytes()?
            .ok_or_else(|| Error::InvalidStructure {
                structure: "PFX",
                reason: "authSafe without content".into(),
            })?;
        let mac_data = match reader.read_optional(Tag::SEQUENCE) {
            Some(mac) => {
                let mac: MacData = mac.decode()?;
                Some(mac)
            }
            None => None,
        };
        reader.finish()?;
        Ok(Pfx {
            auth_safe,
            mac_data,
        })
    }
}

impl EncodableTo<Pfx> for Tlv {}

impl Encoder<Pfx, Tlv> for Pfx {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(self.to_tlv())
    }
}

/*
https://datatracker.ietf.org/doc/html/rfc2315#section-13

EncryptedData ::= SEQUENCE {
    version Version,
    encryptedContentInfo EncryptedContentInfo
}

EncryptedContentInfo ::= SEQUENCE {
    contentType ContentType,
    contentEncryptionAlgorithm ContentEncryptionAlgorithmIdentifier,
    encryptedContent [0] IMPLICIT EncryptedContent OPTIONAL
}
 */

/// A password-encrypted SafeContents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    pub content_type: ObjectIdentifier,
    pub algorithm: AlgorithmIdentifier,
    pub encrypted_content: Vec<u8>,
}

impl EncryptedData {
    pub fn encrypt(
        primitives: &Primitives,
        scheme: &PbeScheme,
        password: &str,
        plaintext: &[u8],
    ) -> Result<Self> {
        Ok(EncryptedData {
            content_type: oids::DATA,
            algorithm: scheme.to_algorithm_identifier()?,
            encrypted_content: scheme.encrypt(primitives, password, plaintext)?,
        })
    }

    pub fn scheme(&self) -> Result<PbeScheme> {
        Ok(PbeScheme::from_algorithm_identifier(&self.algorithm)?)
    }

    pub fn to_tlv(&self) -> Tlv {
        Tlv::sequence(vec![
            Tlv::small_integer(0),
            Tlv::sequence(vec![
                Tlv::object_identifier(&self.content_type),
                self.algorithm.to_tlv(),
                Tlv::primitive(Tag::context(0, false), self.encrypted_content.clone()),
            ]),
        ])
    }

    pub fn to_content_info(&self) -> ContentInfo {
        ContentInfo::new(oids::ENCRYPTED_DATA, Some(self.to_tlv()))
    }
}

impl DecodableFrom<Tlv> for EncryptedData {}

impl Decoder<Tlv, EncryptedData> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<EncryptedData> {
        let mut reader = self.sequence_reader("EncryptedData")?;
        let version = reader.read()?.as_u64()?;
        if version != 0 {
            tracing::debug!(version, "unexpected EncryptedData version");
        }
        let mut content = reader.read()?.sequence_reader("EncryptedContentInfo")?;
        let content_type = content.read()?.as_object_identifier()?;
        let algorithm: AlgorithmIdentifier = content.read()?.decode()?;
        // primitive or BER constructed
        let encrypted_content = match content.peek_tag() {
            Some(tag) if tag.with_constructed(false) == Tag::context(0, false) => {
                content.read()?.octets()?
            }
            _ => Vec::new(),
        };
        content.finish()?;
        reader.finish()?;
        Ok(EncryptedData {
            content_type,
            algorithm,
            encrypted_content,
        })
    }
}

impl EncodableTo<EncryptedData> for Tlv {}

impl Encoder<EncryptedData, Tlv> for EncryptedData {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(self.to_tlv())
    }
}

#[cfg(test)]
mod tests {
    use kura::decoder::Decoder;
    use kura_crypto::{DigestAlgorithm, Primitives};
    use kura_der::{Limits, Tag, Tlv};
    use rstest::rstest;

    use super::{EncryptedData, Pfx, encode_authenticated_safe};
    use crate::oids;
    use crate::pbe::{PbeAlgorithm, PbeScheme};
    use crate::pkcs12::error::Error;
    use crate::pkcs12::mac::MacData;
    use crate::pkcs7::ContentInfo;

    #[test]
    fn test_pfx_round_trip() {
        let primitives = Primitives::default();
        let auth_safe = encode_authenticated_safe(&[ContentInfo::data(
            &Tlv::sequence(vec![]).to_der(),
        )]);
        let mac_data = MacData::compute(
            &primitives,
            DigestAlgorithm::Sha1,
            "pw",
            vec![3; 20],
            1024,
            &auth_safe,
        )
        .unwrap();
        let pfx = Pfx {
            auth_safe,
            mac_data: Some(mac_data),
        };
        let decoded = Pfx::from_der(&pfx.to_der(), &Limits::default()).unwrap();
        assert_eq!(pfx, decoded);
        assert_eq!(1, decoded.contents(&Limits::default()).unwrap().len());
    }

    #[rstest(version, case(0), case(1), case(2), case(4))]
    fn test_invalid_version(version: u64) {
        let tlv = Tlv::sequence(vec![
            Tlv::small_integer(version),
            ContentInfo::data(&[0x30, 0x00]).to_tlv(),
        ]);
        assert!(matches!(
            Pfx::from_der(&tlv.to_der(), &Limits::default()),
            Err(Error::InvalidVersion(v)) if v == version
        ));
    }

    #[test]
    fn test_signed_auth_safe_is_unsupported() {
        let tlv = Tlv::sequence(vec![
            Tlv::small_integer(3),
            ContentInfo::new(oids::SIGNED_DATA, Some(Tlv::sequence(vec![]))).to_tlv(),
        ]);
        assert!(matches!(
            Pfx::from_der(&tlv.to_der(), &Limits::default()),
            Err(Error::UnsupportedContentType(oid)) if oid == oids::SIGNED_DATA
        ));
    }

    #[test]
    fn test_encrypted_data_round_trip() {
        let primitives = Primitives::default();
        let scheme =
            PbeScheme::generate(PbeAlgorithm::Sha1AndRc2_40, primitives.random.as_ref(), 64, 8)
                .unwrap();
        let encrypted = EncryptedData::encrypt(&primitives, &scheme, "pw", b"safe contents").unwrap();
        let tlv = encrypted.to_tlv();
        assert_eq!(
            Tag::context(0, false),
            tlv.children()[1].children()[2].tag()
        );
        let decoded: EncryptedData = tlv.decode().unwrap();
        assert_eq!(encrypted, decoded);
        let plain = decoded
            .scheme()
            .unwrap()
            .decrypt(&primitives, "pw", &decoded.encrypted_content)
            .unwrap();
        assert_eq!(b"safe contents".to_vec(), plain);
    }

    #[test]
    fn test_constructed_encrypted_content() {
        let primitives = Primitives::default();
        let scheme =
            PbeScheme::generate(PbeAlgorithm::Sha1AndDesEde, primitives.random.as_ref(), 8, 8)
                .unwrap();
        let encrypted = EncryptedData::encrypt(&primitives, &scheme, "pw", b"chunked safe contents").unwrap();
        let (head, tail) = encrypted.encrypted_content.split_at(8);
        let tlv = Tlv::sequence(vec![
            Tlv::small_integer(0),
            Tlv::sequence(vec![
                Tlv::object_identifier(&oids::DATA),
                encrypted.algorithm.to_tlv(),
                Tlv::constructed(
                    Tag::context(0, true),
                    vec![Tlv::octet_string(head), Tlv::octet_string(tail)],
                ),
            ]),
        ]);
        let decoded: EncryptedData = tlv.decode().unwrap();
        assert_eq!(encrypted.encrypted_content, decoded.encrypted_content);
    }
}
