use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};
use kura_der::{Limits, ObjectIdentifier, Tag, Tlv};

use super::error::{Error, Result};
use crate::oids;
use crate::pkcs8::EncryptedPrivateKeyInfo;
use crate::pkcs9::{Pkcs9Attributes, RawAttribute};
use crate::pkcs9::attribute::{Attribute, FriendlyName, LocalKeyId};

/*
https://datatracker.ietf.org/doc/html/rfc7292#section-4.2

SafeContents ::= SEQUENCE OF SafeBag

SafeBag ::= SEQUENCE {
    bagId          BAG-TYPE.&id ({PKCS12BagSet}),
    bagValue       [0] EXPLICIT BAG-TYPE.&Type({PKCS12BagSet}{@bagId}),
    bagAttributes  SET OF PKCS12Attribute OPTIONAL
}

CertBag ::= SEQUENCE {
    certId    BAG-TYPE.&id   ({CertTypes}),
    certValue [0] EXPLICIT BAG-TYPE.&Type ({CertTypes}{@certId})
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeBag {
    pub bag_id: ObjectIdentifier,
    /// The bag value without its `[0]` wrapper.
    pub value: Tlv,
    pub attributes: Option<Pkcs9Attributes>,
}

impl SafeBag {
    pub fn new(bag_id: ObjectIdentifier, value: Tlv, attributes: Vec<RawAttribute>) -> Result<Self> {
        let attributes = if attributes.is_empty() {
            None
        } else {
            Some(Pkcs9Attributes::new(attributes)?)
        };
        Ok(SafeBag {
            bag_id,
            value,
            attributes,
        })
    }

    pub fn shrouded_key(
        info: &EncryptedPrivateKeyInfo,
        friendly_name: Option<&str>,
        key_id: Option<&[u8]>,
    ) -> Result<Self> {
        Self::new(
            oids::PKCS8_SHROUDED_KEY_BAG,
            info.to_tlv(),
            bag_attributes(friendly_name, key_id)?,
        )
    }

    /// An x509Certificate cert bag.
    pub fn certificate(
        encoded: &[u8],
        friendly_name: Option<&str>,
        key_id: Option<&[u8]>,
    ) -> Result<Self> {
        let cert_bag = Tlv::sequence(vec![
            Tlv::object_identifier(&oids::X509_CERTIFICATE),
            Tlv::explicit(0, Tlv::octet_string(encoded)),
        ]);
        Self::new(
            oids::CERT_BAG,
            cert_bag,
            bag_attributes(friendly_name, key_id)?,
        )
    }

    pub fn friendly_name(&self) -> Result<Option<String>> {
        let Some(attributes) = &self.attributes else {
            return Ok(None);
        };
        let name: Option<FriendlyName> = attributes.attribute()?;
        Ok(name.map(|name| name.name().to_string()))
    }

    pub fn local_key_id(&self) -> Result<Option<Vec<u8>>> {
        let Some(attributes) = &self.attributes else {
            return Ok(None);
        };
        let key_id: Option<LocalKeyId> = attributes.attribute()?;
        Ok(key_id.map(|key_id| key_id.key_id()))
    }

    /// The encoded certificate of an x509Certificate cert bag. Other
    /// certificate types give `None`.
    pub fn certificate_der(&self) -> Result<Option<Vec<u8>>> {
        let mut reader = self.value.sequence_reader("CertBag")?;
        let cert_id = reader.read()?.as_object_identifier()?;
        let value = reader.read()?.explicit_inner(0)?;
        reader.finish()?;
        if cert_id != oids::X509_CERTIFICATE {
            tracing::debug!(cert_type = %oids::describe(&cert_id), "skipping certificate type");
            return Ok(None);
        }
        Ok(Some(value.as_octet_string()?))
    }

    pub fn key_info(&self) -> Result<EncryptedPrivateKeyInfo> {
        let info: EncryptedPrivateKeyInfo = self.value.decode()?;
        Ok(info)
    }

    pub fn to_tlv(&self) -> Tlv {
        let mut fields = vec![
            Tlv::object_identifier(&self.bag_id),
            Tlv::explicit(0, self.value.clone()),
        ];
        if let Some(attributes) = &self.attributes {
            fields.push(attributes.as_tlv().clone());
        }
        Tlv::sequence(fields)
    }
}

fn bag_attributes(
    friendly_name: Option<&str>,
    key_id: Option<&[u8]>,
) -> Result<Vec<RawAttribute>> {
    let mut attributes = Vec::new();
    if let Some(name) = friendly_name {
        attributes.push(FriendlyName::new(name)?.to_raw());
    }
    if let Some(id) = key_id {
        attributes.push(LocalKeyId::new(id.to_vec())?.to_raw());
    }
    Ok(attributes)
}

impl DecodableFrom<Tlv> for SafeBag {}

impl Decoder<Tlv, SafeBag> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<SafeBag> {
        let mut reader = self.sequence_reader("SafeBag")?;
        let bag_id = reader.read()?.as_object_identifier()?;
        let value = reader
            .read()?
            .expect_tag(Tag::context(0, true))?
            .explicit_inner(0)?
            .clone();
        // PKCS#12 carries vendor attributes freely, only the known ones are kept
        let attributes = reader
            .read_optional(Tag::SET)
            .map(|set| Pkcs9Attributes::decode(set, true))
            .transpose()?;
        reader.finish()?;
        Ok(SafeBag {
            bag_id,
            value,
            attributes,
        })
    }
}

impl EncodableTo<SafeBag> for Tlv {}

impl Encoder<SafeBag, Tlv> for SafeBag {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(self.to_tlv())
    }
}

pub fn decode_safe_contents(bytes: &[u8], limits: &Limits) -> Result<Vec<SafeBag>> {
    decode_safe_contents_tlv(&Tlv::from_bytes_with_limits(bytes, limits)?)
}

pub fn decode_safe_contents_tlv(tlv: &Tlv) -> Result<Vec<SafeBag>> {
    tlv.as_sequence()?.iter().map(|bag| bag.decode()).collect()
}

pub fn encode_safe_contents(bags: &[SafeBag]) -> Vec<u8> {
    Tlv::sequence(bags.iter().map(SafeBag::to_tlv).collect()).to_der()
}
