//! PKCS#9 signingTime attribute (OID: 1.2.840.113549.1.9.5)
//!
//! Defined in RFC 2985 Section 5.3.3
//!
//! ```asn1
//! signingTime ATTRIBUTE ::= {
//!     WITH SYNTAX SigningTime
//!     EQUALITY MATCHING RULE signingTimeMatch
//!     SINGLE VALUE TRUE
//!     ID pkcs-9-at-signingTime
//! }
//!
//! SigningTime ::= Time -- imported from ISO/IEC 9594-8
//! ```
//!
//! Dates between 1950 and 2049 are encoded as UTCTime, others as
//! GeneralizedTime.

use chrono::{DateTime, Datelike, Utc};
use kura_der::{ObjectIdentifier, Tag, Tlv};
use serde::Serialize;

use crate::oids;
use crate::pkcs9::error::{Error, Result};

use super::Attribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningTime {
    signing_time: DateTime<Utc>,
}

impl SigningTime {
    pub fn new(signing_time: DateTime<Utc>) -> Self {
        Self { signing_time }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.signing_time
    }
}

impl Attribute for SigningTime {
    const OID: ObjectIdentifier = oids::SIGNING_TIME;

    fn parse_value(value: &Tlv) -> Result<Self> {
        kura_x509::certificate::parse_time(value)
            .map(Self::new)
            .map_err(|e| Error::InvalidSigningTime(e.to_string()))
    }

    fn to_value(&self) -> Tlv {
        let year = self.signing_time.year();
        if (1950..2050).contains(&year) {
            let text = self.signing_time.format("%y%m%d%H%M%SZ").to_string();
            Tlv::primitive(Tag::UTC_TIME, text.into_bytes())
        } else {
            let text = self.signing_time.format("%Y%m%d%H%M%SZ").to_string();
            Tlv::primitive(Tag::GENERALIZED_TIME, text.into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use kura_der::{Tag, Tlv};
    use rstest::rstest;

    use super::SigningTime;
    use crate::pkcs9::attribute::Attribute;
    use crate::pkcs9::error::Error;

    #[rstest]
    #[case::utc_time(2024, Tag::UTC_TIME, "240102030405Z")]
    #[case::before_1950(1949, Tag::GENERALIZED_TIME, "19490102030405Z")]
    #[case::after_2049(2050, Tag::GENERALIZED_TIME, "20500102030405Z")]
    fn test_signing_time_encoding(#[case] year: i32, #[case] tag: Tag, #[case] text: &str) {
        let time = Utc.with_ymd_and_hms(year, 1, 2, 3, 4, 5).unwrap();
        let value = SigningTime::new(time).to_value();
        assert_eq!(tag, value.tag());
        assert_eq!(text.as_bytes(), value.content());
        assert_eq!(time, SigningTime::parse_value(&value).unwrap().time());
    }

    #[test]
    fn test_signing_time_invalid() {
        let value = Tlv::primitive(Tag::UTC_TIME, b"not a time".to_vec());
        assert!(matches!(
            SigningTime::parse_value(&value),
            Err(Error::InvalidSigningTime(_))
        ));
    }
}
