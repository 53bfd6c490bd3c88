//! Object identifiers of the PKCS#5, #7, #9 and #12 structures.

use std::collections::HashMap;
use std::sync::LazyLock;

use kura_der::ObjectIdentifier;

const fn oid(arcs: &'static [u64]) -> ObjectIdentifier {
    ObjectIdentifier::from_static(arcs)
}

// PKCS#7 content types
pub const DATA: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 7, 1]);
pub const SIGNED_DATA: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 7, 2]);
pub const ENVELOPED_DATA: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 7, 3]);
pub const SIGNED_AND_ENVELOPED_DATA: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 7, 4]);
pub const DIGESTED_DATA: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 7, 5]);
pub const ENCRYPTED_DATA: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 7, 6]);
/// Misspelled signedData identifier written by old signers.
pub const LEGACY_SIGNED_DATA: ObjectIdentifier = oid(&[1, 2, 840, 1113549, 1, 7, 2]);
pub const NETSCAPE_CERT_SEQUENCE: ObjectIdentifier = oid(&[2, 16, 840, 1, 113730, 2, 5]);

// PKCS#9 attributes
pub const EMAIL_ADDRESS: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 1]);
pub const UNSTRUCTURED_NAME: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 2]);
pub const CONTENT_TYPE: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 3]);
pub const MESSAGE_DIGEST: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 4]);
pub const SIGNING_TIME: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 5]);
pub const COUNTERSIGNATURE: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 6]);
pub const CHALLENGE_PASSWORD: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 7]);
pub const UNSTRUCTURED_ADDRESS: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 8]);
pub const EXTENDED_CERTIFICATE_ATTRIBUTES: ObjectIdentifier =
    oid(&[1, 2, 840, 113549, 1, 9, 9]);
pub const EXTENSION_REQUEST: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 14]);
pub const SMIME_CAPABILITIES: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 15]);
pub const SIGNING_CERTIFICATE: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 16, 2, 12]);
pub const SIGNATURE_TIMESTAMP_TOKEN: ObjectIdentifier =
    oid(&[1, 2, 840, 113549, 1, 9, 16, 2, 14]);
pub const SIGNING_CERTIFICATE_V2: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 16, 2, 47]);
pub const FRIENDLY_NAME: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 20]);
pub const LOCAL_KEY_ID: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 21]);
pub const X509_CERTIFICATE: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 9, 22, 1]);

// PKCS#12 bag types
pub const KEY_BAG: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 10, 1, 1]);
pub const PKCS8_SHROUDED_KEY_BAG: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 10, 1, 2]);
pub const CERT_BAG: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 10, 1, 3]);
pub const CRL_BAG: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 10, 1, 4]);
pub const SECRET_BAG: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 10, 1, 5]);
pub const SAFE_CONTENTS_BAG: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 10, 1, 6]);

// PKCS#12 password based encryption
pub const PBE_SHA1_RC4_128: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 1, 1]);
pub const PBE_SHA1_RC4_40: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 1, 2]);
pub const PBE_SHA1_DES_EDE: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 1, 3]);
pub const PBE_SHA1_DES2_EDE: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 1, 4]);
pub const PBE_SHA1_RC2_128: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 1, 5]);
pub const PBE_SHA1_RC2_40: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 12, 1, 6]);

// PKCS#5
pub const PBKDF2: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 5, 12]);
pub const PBES2: ObjectIdentifier = oid(&[1, 2, 840, 113549, 1, 5, 13]);

static NAMES: LazyLock<HashMap<ObjectIdentifier, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (DATA, "data"),
        (SIGNED_DATA, "signedData"),
        (ENVELOPED_DATA, "envelopedData"),
        (SIGNED_AND_ENVELOPED_DATA, "signedAndEnvelopedData"),
        (DIGESTED_DATA, "digestedData"),
        (ENCRYPTED_DATA, "encryptedData"),
        (LEGACY_SIGNED_DATA, "signedData (legacy)"),
        (NETSCAPE_CERT_SEQUENCE, "netscapeCertSequence"),
        (EMAIL_ADDRESS, "emailAddress"),
        (UNSTRUCTURED_NAME, "unstructuredName"),
        (CONTENT_TYPE, "contentType"),
        (MESSAGE_DIGEST, "messageDigest"),
        (SIGNING_TIME, "signingTime"),
        (COUNTERSIGNATURE, "countersignature"),
        (CHALLENGE_PASSWORD, "challengePassword"),
        (UNSTRUCTURED_ADDRESS, "unstructuredAddress"),
        (EXTENDED_CERTIFICATE_ATTRIBUTES, "extendedCertificateAttributes"),
        (EXTENSION_REQUEST, "extensionRequest"),
        (SMIME_CAPABILITIES, "smimeCapabilities"),
        (SIGNING_CERTIFICATE, "signingCertificate"),
        (SIGNATURE_TIMESTAMP_TOKEN, "signatureTimestampToken"),
        (SIGNING_CERTIFICATE_V2, "signingCertificateV2"),
        (FRIENDLY_NAME, "friendlyName"),
        (LOCAL_KEY_ID, "localKeyId"),
        (X509_CERTIFICATE, "x509Certificate"),
        (KEY_BAG, "keyBag"),
        (PKCS8_SHROUDED_KEY_BAG, "pkcs8ShroudedKeyBag"),
        (CERT_BAG, "certBag"),
        (CRL_BAG, "crlBag"),
        (SECRET_BAG, "secretBag"),
        (SAFE_CONTENTS_BAG, "safeContentsBag"),
        (PBE_SHA1_RC4_128, "pbeWithSHAAnd128BitRC4"),
        (PBE_SHA1_RC4_40, "pbeWithSHAAnd40BitRC4"),
        (PBE_SHA1_DES_EDE, "pbeWithSHAAnd3-KeyTripleDES-CBC"),
        (PBE_SHA1_DES2_EDE, "pbeWithSHAAnd2-KeyTripleDES-CBC"),
        (PBE_SHA1_RC2_128, "pbeWithSHAAnd128BitRC2-CBC"),
        (PBE_SHA1_RC2_40, "pbewithSHAAnd40BitRC2-CBC"),
        (PBKDF2, "PBKDF2"),
        (PBES2, "PBES2"),
    ])
});

/// Registered name of `oid`, if it is one of the identifiers above.
pub fn name(oid: &ObjectIdentifier) -> Option<&'static str> {
    NAMES.get(oid).copied()
}

/// Name for log and error messages, the dotted form when unregistered.
pub fn describe(oid: &ObjectIdentifier) -> String {
    match name(oid) {
        Some(name) => name.to_string(),
        None => oid.to_string(),
    }
}
