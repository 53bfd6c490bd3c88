//! OBJECT IDENTIFIER codec.
//!
//! The first two arcs share one subidentifier (`40 * arc0 + arc1`); every
//! subidentifier is written base-128, most significant group first, with
//! the continuation bit set on all but the last byte.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentifier {
    arcs: Cow<'static, [u64]>,
}

impl ObjectIdentifier {
    /// Constant identifier. The arcs are trusted to be well formed.
    pub const fn from_static(arcs: &'static [u64]) -> Self {
        ObjectIdentifier {
            arcs: Cow::Borrowed(arcs),
        }
    }

    pub fn new(arcs: Vec<u64>) -> Result<Self> {
        match arcs.as_slice() {
            [first, second, ..] => {
                if *first > 2 {
                    return Err(Error::InvalidObjectIdentifier(format!(
                        "first arc must be 0, 1 or 2, got {first}"
                    )));
                }
                if *first < 2 && *second >= 40 {
                    return Err(Error::InvalidObjectIdentifier(format!(
                        "second arc must be below 40, got {second}"
                    )));
                }
                if *second > u64::MAX - 80 {
                    return Err(Error::InvalidObjectIdentifier(
                        "second arc out of range".into(),
                    ));
                }
            }
            _ => {
                return Err(Error::InvalidObjectIdentifier(
                    "at least two arcs are required".into(),
                ));
            }
        }
        Ok(ObjectIdentifier {
            arcs: Cow::Owned(arcs),
        })
    }

    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    pub fn from_der_content(content: &[u8]) -> Result<Self> {
        if content.is_empty() {
            return Err(Error::InvalidObjectIdentifier("empty content".into()));
        }
        let mut arcs = Vec::new();
        let mut value: u64 = 0;
        let mut pending = false;
        for &b in content {
            if !pending && b == 0x80 {
                return Err(Error::InvalidObjectIdentifier(
                    "non-minimal subidentifier".into(),
                ));
            }
            value = value
                .checked_mul(128)
                .map(|v| v | (b & 0x7f) as u64)
                .ok_or_else(|| Error::InvalidObjectIdentifier("arc overflows 64 bits".into()))?;
            if b & 0x80 != 0 {
                pending = true;
                continue;
            }
            if arcs.is_empty() {
                let (first, second) = match value {
                    v if v < 40 => (0, v),
                    v if v < 80 => (1, v - 40),
                    v => (2, v - 80),
                };
                arcs.push(first);
                arcs.push(second);
            } else {
                arcs.push(value);
            }
            value = 0;
            pending = false;
        }
        if pending {
            return Err(Error::InvalidObjectIdentifier(
                "truncated subidentifier".into(),
            ));
        }
        Ok(ObjectIdentifier {
            arcs: Cow::Owned(arcs),
        })
    }

    pub fn to_der_content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if let [first, second, rest @ ..] = self.arcs.as_ref() {
            encode_subidentifier(first.saturating_mul(40).saturating_add(*second), &mut out);
            for arc in rest {
                encode_subidentifier(*arc, &mut out);
            }
        }
        out
    }
}

fn encode_subidentifier(mut value: u64, out: &mut Vec<u8>) {
    // 64 bits need at most 10 groups of 7
    let mut buf = [0u8; 10];
    let mut pos = buf.len() - 1;
    buf[pos] = (value & 0x7f) as u8;
    value >>= 7;
    while value > 0 {
        pos -= 1;
        buf[pos] = 0x80 | (value & 0x7f) as u8;
        value >>= 7;
    }
    out.extend_from_slice(&buf[pos..]);
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let dotted = self
            .arcs
            .iter()
            .map(|arc| arc.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", dotted)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let arcs = s
            .split('.')
            .map(|arc| {
                arc.parse::<u64>()
                    .map_err(|_| Error::InvalidObjectIdentifier(format!("invalid arc {arc:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        ObjectIdentifier::new(arcs)
    }
}

impl Serialize for ObjectIdentifier {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectIdentifier {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObjectIdentifier::from_str(&s).map_err(de::Error::custom)
    }
}
