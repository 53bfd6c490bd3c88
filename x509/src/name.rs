//! Distinguished names.
//!
//! Two names are equal when their attributes match after string
//! preparation: the string type is ignored, case is folded and runs of
//! whitespace collapse to one space. Values that are not strings compare by
//! encoding. The raw DER is kept for re-encoding. The `Display` form follows RFC 2253: RDNs in reverse order, short attribute
//! names where one is registered, the dotted OID and a `#hex` value
//! otherwise.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use kura::decoder::{DecodableFrom, Decoder};
use kura_der::{ObjectIdentifier, Tag, Tlv};

use crate::error::{Error, Result};

pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 5, 4, 3]);
pub const COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 5, 4, 6]);
pub const LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 5, 4, 7]);
pub const STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 5, 4, 8]);
pub const STREET_ADDRESS: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 5, 4, 9]);
pub const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 5, 4, 10]);
pub const ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier =
    ObjectIdentifier::from_static(&[2, 5, 4, 11]);
pub const DOMAIN_COMPONENT: ObjectIdentifier =
    ObjectIdentifier::from_static(&[0, 9, 2342, 19200300, 100, 1, 25]);
pub const USER_ID: ObjectIdentifier =
    ObjectIdentifier::from_static(&[0, 9, 2342, 19200300, 100, 1, 1]);

const SHORT_NAMES: [(ObjectIdentifier, &str); 9] = [
    (COMMON_NAME, "CN"),
    (COUNTRY_NAME, "C"),
    (LOCALITY_NAME, "L"),
    (STATE_OR_PROVINCE_NAME, "ST"),
    (STREET_ADDRESS, "STREET"),
    (ORGANIZATION_NAME, "O"),
    (ORGANIZATIONAL_UNIT_NAME, "OU"),
    (DOMAIN_COMPONENT, "DC"),
    (USER_ID, "UID"),
];

/*
https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.4

Name ::= CHOICE { -- only one possibility for now --
    rdnSequence  RDNSequence }

RDNSequence ::= SEQUENCE OF RelativeDistinguishedName

RelativeDistinguishedName ::= SET SIZE (1..MAX) OF AttributeTypeAndValue

AttributeTypeAndValue ::= SEQUENCE {
    type     AttributeType,
    value    AttributeValue }
 */

#[derive(Debug, Clone)]
pub struct Name {
    tlv: Tlv,
    encoded: Vec<u8>,
    rdns: Vec<RelativeDistinguishedName>,
    /// Per RDN, the sorted comparison keys of its attributes.
    canonical: Vec<Vec<Vec<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName {
    pub attributes: Vec<AttributeTypeAndValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    pub attribute_type: ObjectIdentifier,
    pub value: Tlv,
}

impl Name {
    pub fn from_der(encoded: &[u8]) -> Result<Self> {
        Tlv::from_bytes(encoded)?.decode()
    }

    /// Name with one single-valued RDN per attribute, most significant first.
    pub fn from_attributes(attributes: &[(ObjectIdentifier, &str)]) -> Self {
        let rdns = attributes
            .iter()
            .map(|(oid, value)| {
                let value = if *oid == COUNTRY_NAME {
                    Tlv::primitive(Tag::PRINTABLE_STRING, value.as_bytes().to_vec())
                } else {
                    Tlv::utf8_string(value)
                };
                RelativeDistinguishedName {
                    attributes: vec![AttributeTypeAndValue {
                        attribute_type: oid.clone(),
                        value,
                    }],
                }
            })
            .collect::<Vec<_>>();
        let tlv = Tlv::sequence(rdns.iter().map(RelativeDistinguishedName::to_tlv).collect());
        Name {
            encoded: tlv.to_der(),
            tlv,
            canonical: canonical_form(&rdns),
            rdns,
        }
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn as_tlv(&self) -> &Tlv {
        &self.tlv
    }

    pub fn rdns(&self) -> &[RelativeDistinguishedName] {
        &self.rdns
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Most specific common name.
    pub fn common_name(&self) -> Option<String> {
        self.rdns
            .iter()
            .rev()
            .flat_map(|rdn| rdn.attributes.iter())
            .find(|atv| atv.attribute_type == COMMON_NAME)
            .and_then(|atv| atv.value.as_string().ok())
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

fn canonical_form(rdns: &[RelativeDistinguishedName]) -> Vec<Vec<Vec<u8>>> {
    rdns.iter()
        .map(|rdn| {
            let mut keys: Vec<Vec<u8>> = rdn
                .attributes
                .iter()
                .map(AttributeTypeAndValue::comparison_key)
                .collect();
            keys.sort();
            keys
        })
        .collect()
}

impl AttributeTypeAndValue {
    fn is_string(&self) -> bool {
        matches!(
            self.value.tag(),
            Tag::UTF8_STRING
                | Tag::PRINTABLE_STRING
                | Tag::IA5_STRING
                | Tag::T61_STRING
                | Tag::BMP_STRING
                | Tag::UNIVERSAL_STRING
        )
    }

    /// Type OID, then a marker byte and either the prepared string or the
    /// value DER.
    fn comparison_key(&self) -> Vec<u8> {
        let mut key = Tlv::object_identifier(&self.attribute_type).to_der();
        match self.value.as_string() {
            Ok(text) if self.is_string() => {
                key.push(0);
                let prepared = text.split_whitespace().collect::<Vec<_>>().join(" ");
                key.extend(prepared.to_lowercase().into_bytes());
            }
            _ => {
                key.push(1);
                key.extend(self.value.to_der());
            }
        }
        key
    }
}

impl RelativeDistinguishedName {
    fn to_tlv(&self) -> Tlv {
        Tlv::set_of(
            self.attributes
                .iter()
                .map(|atv| {
                    Tlv::sequence(vec![
                        Tlv::object_identifier(&atv.attribute_type),
                        atv.value.clone(),
                    ])
                })
                .collect(),
        )
    }
}

impl DecodableFrom<Tlv> for Name {}

impl Decoder<Tlv, Name> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<Name> {
        let rdns = self
            .as_sequence()?
            .iter()
            .map(|rdn| {
                let attributes = rdn.as_set()?;
                if attributes.is_empty() {
                    return Err(Error::InvalidName("empty relative distinguished name".into()));
                }
                let attributes = attributes
                    .iter()
                    .map(|atv| match atv.as_sequence()? {
                        [attribute_type, value] => Ok(AttributeTypeAndValue {
                            attribute_type: attribute_type.as_object_identifier()?,
                            value: value.clone(),
                        }),
                        other => Err(Error::InvalidName(format!(
                            "attribute with {} elements",
                            other.len()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(RelativeDistinguishedName { attributes })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Name {
            tlv: self.clone(),
            encoded: self.to_der(),
            canonical: canonical_form(&rdns),
            rdns,
        })
    }
}

fn escape_value(value: &str, out: &mut String) {
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' => {
                out.push('\\');
                out.push(c);
            }
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
}

impl Display for AttributeTypeAndValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match SHORT_NAMES
            .iter()
            .find(|(oid, _)| *oid == self.attribute_type)
        {
            Some((_, short)) => write!(f, "{short}=")?,
            None => write!(f, "{}=", self.attribute_type)?,
        }
        match self.value.as_string() {
            Ok(text) if self.is_string() => {
                let mut escaped = String::with_capacity(text.len());
                escape_value(&text, &mut escaped);
                f.write_str(&escaped)
            }
            _ => write!(f, "#{}", hex::encode(self.value.to_der())),
        }
    }
}

impl Display for RelativeDistinguishedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, atv) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{atv}")?;
        }
        Ok(())
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, rdn) in self.rdns.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}
