//! X.509 certificate decoding.
//!
//! A decode-only view of the certificate grammar from [RFC 5280 Section 4.1],
//! borrowing from the input buffer. Only `subjectPublicKeyInfo` is consumed
//! downstream, but every field is still typed so that structurally invalid
//! input is rejected instead of silently accepted. Decoding either yields a
//! fully valid [`Certificate`] or fails; there is no partially-valid state.
//!
//! [RFC 5280 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1

use crate::error::DecodeError;

use core::convert::{TryFrom, TryInto};

use der::asn1::{AnyRef, BitStringRef, GeneralizedTime, IntRef, SequenceOf, SetOf, UtcTime};
use der::{Choice, Decode, Enumerated, Sequence, ValueOrd};
use spki::{AlgorithmIdentifierRef, SubjectPublicKeyInfoRef};

/// Upper bound on RDNs in one distinguished name. Public CA practice stays
/// well below this.
const MAX_NAME_RDNS: usize = 8;
/// Upper bound on attributes in one RDN. Multi-valued RDNs are rare.
const MAX_RDN_ATTRIBUTES: usize = 2;

/// Decode a DER-encoded X.509 certificate.
///
/// The input must be raw binary DER; PEM-wrapped input is rejected and has to
/// be converted by the caller first. Trailing bytes after the certificate are
/// an error.
pub fn decode(blob: &[u8]) -> Result<Certificate<'_>, DecodeError> {
    Certificate::from_der(blob).map_err(DecodeError::Malformed)
}

/// X.509 certificates are defined in [RFC 5280 Section 4.1].
///
/// ```text
/// Certificate  ::=  SEQUENCE  {
///     tbsCertificate       TBSCertificate,
///     signatureAlgorithm   AlgorithmIdentifier,
///     signature            BIT STRING
/// }
/// ```
///
/// [RFC 5280 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1
#[derive(Clone, Debug, Sequence)]
pub struct Certificate<'a> {
    pub tbs_certificate: TbsCertificate<'a>,
    pub signature_algorithm: AlgorithmIdentifierRef<'a>,
    pub signature: BitStringRef<'a>,
}

impl<'a> Certificate<'a> {
    /// The `subjectPublicKeyInfo` field, input to key extraction.
    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfoRef<'a> {
        &self.tbs_certificate.subject_public_key_info
    }
}

/// X.509 `TBSCertificate` as defined in [RFC 5280 Section 4.1].
///
/// ```text
/// TBSCertificate  ::=  SEQUENCE  {
///     version         [0]  EXPLICIT Version DEFAULT v1,
///     serialNumber         CertificateSerialNumber,
///     signature            AlgorithmIdentifier,
///     issuer               Name,
///     validity             Validity,
///     subject              Name,
///     subjectPublicKeyInfo SubjectPublicKeyInfo,
///     issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
///     subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
///     extensions      [3]  EXPLICIT Extensions OPTIONAL
/// }
/// ```
///
/// [RFC 5280 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1
#[derive(Clone, Debug, Sequence)]
pub struct TbsCertificate<'a> {
    #[asn1(context_specific = "0", default = "Default::default")]
    pub version: Version,

    pub serial_number: IntRef<'a>,
    pub signature: AlgorithmIdentifierRef<'a>,
    pub issuer: Name<'a>,
    pub validity: Validity,
    pub subject: Name<'a>,
    pub subject_public_key_info: SubjectPublicKeyInfoRef<'a>,

    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub issuer_unique_id: Option<BitStringRef<'a>>,

    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", optional = "true")]
    pub subject_unique_id: Option<BitStringRef<'a>>,

    // Extensions are length-checked but not interpreted; pinning never looks
    // inside them.
    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", optional = "true")]
    pub extensions: Option<AnyRef<'a>>,
}

/// Certificate `Version` as defined in [RFC 5280 Section 4.1].
///
/// ```text
/// Version  ::=  INTEGER  {  v1(0), v2(1), v3(2)  }
/// ```
///
/// [RFC 5280 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1
#[derive(Clone, Debug, Copy, PartialEq, Eq, Enumerated)]
#[asn1(type = "INTEGER")]
#[repr(u8)]
pub enum Version {
    V1 = 0,
    V2 = 1,
    V3 = 2,
}

impl Default for Version {
    fn default() -> Self {
        Self::V1
    }
}

/// X.501 `Name`, used for issuer and subject.
///
/// ```text
/// Name ::= CHOICE { rdnSequence  RDNSequence }
/// RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
/// ```
pub type Name<'a> = SequenceOf<RelativeDistinguishedName<'a>, MAX_NAME_RDNS>;

/// X.501 `RelativeDistinguishedName`.
///
/// ```text
/// RelativeDistinguishedName ::= SET SIZE (1..MAX) OF AttributeTypeAndValue
/// ```
pub type RelativeDistinguishedName<'a> = SetOf<AttributeTypeAndValue<'a>, MAX_RDN_ATTRIBUTES>;

/// X.501 `AttributeTypeAndValue`. The value stays an uninterpreted ANY.
///
/// ```text
/// AttributeTypeAndValue ::= SEQUENCE {
///     type     AttributeType,
///     value    AttributeValue
/// }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Sequence, ValueOrd)]
pub struct AttributeTypeAndValue<'a> {
    pub oid: der::asn1::ObjectIdentifier,
    pub value: AnyRef<'a>,
}

/// X.509 `Validity` as defined in [RFC 5280 Section 4.1.2.5].
///
/// ```text
/// Validity ::= SEQUENCE {
///     notBefore      Time,
///     notAfter       Time
/// }
/// ```
///
/// [RFC 5280 Section 4.1.2.5]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.5
#[derive(Clone, Copy, Debug, Sequence)]
pub struct Validity {
    pub not_before: Time,
    pub not_after: Time,
}

/// X.509 `Time` as defined in [RFC 5280 Section 4.1.2.5].
///
/// ```text
/// Time ::= CHOICE {
///     utcTime        UTCTime,
///     generalTime    GeneralizedTime
/// }
/// ```
///
/// [RFC 5280 Section 4.1.2.5]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.5
#[derive(Clone, Copy, Debug, Choice)]
pub enum Time {
    #[asn1(type = "UTCTime")]
    UtcTime(UtcTime),
    #[asn1(type = "GeneralizedTime")]
    GeneralTime(GeneralizedTime),
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_CERT: &[u8] = include_bytes!("../tests/data/rsa2048.der");
    const P256_CERT: &[u8] = include_bytes!("../tests/data/p256.der");
    const ED25519_CERT: &[u8] = include_bytes!("../tests/data/ed25519.der");

    #[test]
    fn decode_rsa_certificate() {
        let cert = decode(RSA_CERT).unwrap();
        assert_eq!(cert.tbs_certificate.version, Version::V3);
        let spki = cert.subject_public_key_info();
        assert!(spki.subject_public_key.as_bytes().is_some());
    }

    #[test]
    fn decode_p256_certificate() {
        let cert = decode(P256_CERT).unwrap();
        // 65-byte uncompressed point behind the bit string
        let key = cert
            .subject_public_key_info()
            .subject_public_key
            .as_bytes()
            .unwrap();
        assert_eq!(key.len(), 65);
    }

    #[test]
    fn decode_ed25519_certificate() {
        let cert = decode(ED25519_CERT).unwrap();
        let key = cert
            .subject_public_key_info()
            .subject_public_key
            .as_bytes()
            .unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn reject_empty_input() {
        assert!(matches!(decode(&[]), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn reject_truncated_certificate() {
        let truncated = &RSA_CERT[..RSA_CERT.len() - 7];
        assert!(matches!(decode(truncated), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn reject_non_asn1_bytes() {
        let garbage = [0x42u8; 64];
        assert!(matches!(decode(&garbage), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn reject_trailing_bytes() {
        let mut padded = RSA_CERT.to_vec();
        padded.push(0x00);
        assert!(matches!(decode(&padded), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn reject_inner_garbage() {
        // valid outer SEQUENCE header, nonsense body
        let mut bytes = RSA_CERT.to_vec();
        for b in bytes.iter_mut().skip(4).take(32) {
            *b ^= 0xA5;
        }
        assert!(decode(&bytes).is_err());
    }
}
