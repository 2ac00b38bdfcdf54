//! Subject public key extraction and canonical export.
//!
//! The key is taken straight out of `subjectPublicKeyInfo` and interpreted
//! per its declared algorithm, instead of going through a platform trust
//! evaluation. Interpretation forces the same well-formedness checks a
//! provider would apply before handing out a key object.
//!
//! The export layout mirrors the Security-framework external representation
//! the pin values were historically bound to: PKCS#1 DER for RSA, the SEC1
//! uncompressed point for EC keys, raw bytes for Ed25519. Pins computed here
//! are NOT portable to backends that hash the whole SPKI DER instead.

use core::convert::{TryFrom, TryInto};

use crate::error::KeyError;
use crate::x509::Certificate;

use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1};
use const_oid::db::rfc8410::ID_ED_25519;
use der::asn1::ObjectIdentifier;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use spki::AlgorithmIdentifierRef;

const SEC1_TAG_COMPRESSED_EVEN: u8 = 0x02;
const SEC1_TAG_COMPRESSED_ODD: u8 = 0x03;
const SEC1_TAG_UNCOMPRESSED: u8 = 0x04;

/// A certificate's subject public key, interpreted per its declared
/// algorithm. Holds no private counterpart.
#[derive(Clone, Debug, PartialEq)]
pub enum PublicKey<'a> {
    /// RSA key; the borrowed bytes are the PKCS#1 `RSAPublicKey` DER the
    /// certificate carries, already structurally validated.
    Rsa(&'a [u8]),
    /// NIST P-256 key, validated to lie on the curve.
    EcP256(p256::PublicKey),
    /// EC key on another named curve; SEC1 framing checked, point not
    /// verified against the curve equation.
    Ec {
        curve: ObjectIdentifier,
        point: &'a [u8],
    },
    /// Ed25519 key, 32 raw bytes.
    Ed25519(&'a [u8; 32]),
    /// Recognizably well-formed SPKI with an algorithm this crate has no
    /// export convention for. Export always fails.
    Opaque {
        algorithm: ObjectIdentifier,
        key: &'a [u8],
    },
}

/// Canonical external representation of a [`PublicKey`], ready for hashing.
#[derive(Clone, Debug)]
pub enum KeyBytes<'a> {
    /// Bytes borrowed straight from the certificate's SPKI bit string.
    Raw(&'a [u8]),
    /// P-256 point re-encoded in uncompressed form. Equal to the certificate
    /// bytes unless the certificate carried a compressed point.
    Point(p256::EncodedPoint),
}

impl AsRef<[u8]> for KeyBytes<'_> {
    fn as_ref(&self) -> &[u8] {
        match self {
            KeyBytes::Raw(bytes) => bytes,
            KeyBytes::Point(point) => point.as_bytes(),
        }
    }
}

/// Derive the subject public key from a decoded certificate.
///
/// Fails with [`KeyError::KeyUnavailable`] when the SPKI bit string holds no
/// byte-aligned material, and [`KeyError::EvaluationFailed`] when the
/// material is malformed for the declared algorithm.
pub fn extract_public_key<'a>(cert: &Certificate<'a>) -> Result<PublicKey<'a>, KeyError> {
    let spki = cert.subject_public_key_info();
    let key = spki
        .subject_public_key
        .as_bytes()
        .ok_or(KeyError::KeyUnavailable)?;
    if key.is_empty() {
        return Err(KeyError::KeyUnavailable);
    }

    let algorithm = spki.algorithm.oid;
    if algorithm == pkcs1::ALGORITHM_OID {
        // RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }
        pkcs1::RsaPublicKey::try_from(key).map_err(|_| KeyError::EvaluationFailed)?;
        Ok(PublicKey::Rsa(key))
    } else if algorithm == ID_EC_PUBLIC_KEY {
        let curve = named_curve(&spki.algorithm)?;
        if curve == SECP_256_R_1 {
            let point =
                p256::PublicKey::from_sec1_bytes(key).map_err(|_| KeyError::EvaluationFailed)?;
            Ok(PublicKey::EcP256(point))
        } else {
            check_sec1_framing(key)?;
            Ok(PublicKey::Ec { curve, point: key })
        }
    } else if algorithm == ID_ED_25519 {
        let key: &'a [u8; 32] = key.try_into().map_err(|_| KeyError::EvaluationFailed)?;
        Ok(PublicKey::Ed25519(key))
    } else {
        warn!("no export convention for key algorithm");
        Ok(PublicKey::Opaque { algorithm, key })
    }
}

/// Export the key's canonical external byte representation.
///
/// Deterministic: the same key always exports to the same bytes. Fails with
/// [`KeyError::ExportFailed`] for [`PublicKey::Opaque`] keys and for
/// compressed points on curves this crate cannot decompress.
pub fn export_bytes<'a>(key: &PublicKey<'a>) -> Result<KeyBytes<'a>, KeyError> {
    match key {
        PublicKey::Rsa(der) => Ok(KeyBytes::Raw(*der)),
        PublicKey::EcP256(point) => {
            trace!("exporting P-256 key as uncompressed point");
            Ok(KeyBytes::Point(point.to_encoded_point(false)))
        }
        PublicKey::Ec { point, .. } => {
            if point.first() == Some(&SEC1_TAG_UNCOMPRESSED) {
                Ok(KeyBytes::Raw(*point))
            } else {
                Err(KeyError::ExportFailed)
            }
        }
        PublicKey::Ed25519(key) => Ok(KeyBytes::Raw(*key)),
        PublicKey::Opaque { .. } => Err(KeyError::ExportFailed),
    }
}

/// EC algorithm parameters must name a curve by OID; the other RFC 5480
/// parameter forms are obsolete and rejected.
fn named_curve(algorithm: &AlgorithmIdentifierRef<'_>) -> Result<ObjectIdentifier, KeyError> {
    let params = algorithm.parameters.ok_or(KeyError::EvaluationFailed)?;
    params
        .decode_as::<ObjectIdentifier>()
        .map_err(|_| KeyError::EvaluationFailed)
}

/// A SEC1 point starts with 0x04 (uncompressed, odd total length) or
/// 0x02/0x03 (compressed).
fn check_sec1_framing(point: &[u8]) -> Result<(), KeyError> {
    match point.first() {
        Some(&SEC1_TAG_UNCOMPRESSED) if point.len() % 2 == 1 && point.len() > 1 => Ok(()),
        Some(&SEC1_TAG_COMPRESSED_EVEN) | Some(&SEC1_TAG_COMPRESSED_ODD) if point.len() > 1 => {
            Ok(())
        }
        _ => Err(KeyError::EvaluationFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeyError;
    use crate::x509::decode;
    use der::asn1::BitStringRef;
    use der::Encode;

    const RSA_CERT: &[u8] = include_bytes!("../tests/data/rsa2048.der");
    const P256_CERT: &[u8] = include_bytes!("../tests/data/p256.der");
    const ED25519_CERT: &[u8] = include_bytes!("../tests/data/ed25519.der");

    #[test]
    fn extract_rsa_key() {
        let cert = decode(RSA_CERT).unwrap();
        let key = extract_public_key(&cert).unwrap();
        match key {
            // 2048-bit modulus: 10 bytes of SEQUENCE/INTEGER framing, 257
            // byte modulus body, 5 bytes of exponent
            PublicKey::Rsa(der) => assert_eq!(der.len(), 270),
            other => panic!("expected RSA key, got {:?}", other),
        }
    }

    #[test]
    fn rsa_export_borrows_certificate_bytes() {
        let cert = decode(RSA_CERT).unwrap();
        let spki_bytes = cert
            .subject_public_key_info()
            .subject_public_key
            .as_bytes()
            .unwrap();
        let key = extract_public_key(&cert).unwrap();
        let exported = export_bytes(&key).unwrap();
        assert_eq!(exported.as_ref(), spki_bytes);
    }

    #[test]
    fn extract_p256_key_and_export_uncompressed() {
        let cert = decode(P256_CERT).unwrap();
        let key = extract_public_key(&cert).unwrap();
        assert!(matches!(key, PublicKey::EcP256(_)));

        let exported = export_bytes(&key).unwrap();
        let bytes = exported.as_ref();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], SEC1_TAG_UNCOMPRESSED);
        // fixture already carries the uncompressed form, so the export must
        // be byte-identical to the certificate
        let spki_bytes = cert
            .subject_public_key_info()
            .subject_public_key
            .as_bytes()
            .unwrap();
        assert_eq!(bytes, spki_bytes);
    }

    #[test]
    fn extract_ed25519_key() {
        let cert = decode(ED25519_CERT).unwrap();
        let key = extract_public_key(&cert).unwrap();
        assert!(matches!(key, PublicKey::Ed25519(_)));
        assert_eq!(export_bytes(&key).unwrap().as_ref().len(), 32);
    }

    #[test]
    fn export_is_deterministic() {
        let cert = decode(P256_CERT).unwrap();
        let key = extract_public_key(&cert).unwrap();
        let first = export_bytes(&key).unwrap();
        let second = export_bytes(&key).unwrap();
        assert_eq!(first.as_ref(), second.as_ref());
    }

    #[test]
    fn corrupt_rsa_key_material_fails_evaluation() {
        // break the PKCS#1 SEQUENCE tag inside the bit string; the outer
        // certificate still decodes because the bit string stays opaque
        let mut bytes = RSA_CERT.to_vec();
        let pkcs1_start = bytes
            .windows(4)
            .position(|w| w == &[0x30, 0x82, 0x01, 0x0A][..])
            .expect("fixture contains a 2048-bit RSAPublicKey header");
        bytes[pkcs1_start] = 0x31;

        let cert = decode(&bytes).unwrap();
        assert_eq!(
            extract_public_key(&cert).unwrap_err(),
            KeyError::EvaluationFailed
        );
    }

    #[test]
    fn unaligned_bit_string_means_no_key() {
        // rebuild the fixture with unused bits in the SPKI bit string
        let original = decode(P256_CERT).unwrap();
        let point = original
            .subject_public_key_info()
            .subject_public_key
            .as_bytes()
            .unwrap()
            .to_vec();

        let mut cert = decode(P256_CERT).unwrap();
        cert.tbs_certificate.subject_public_key_info.subject_public_key =
            BitStringRef::new(4, &point[..point.len() - 1]).unwrap();

        let mut buf = [0u8; 1024];
        let der = cert.encode_to_slice(&mut buf).unwrap();
        let reparsed = decode(der).unwrap();
        assert_eq!(
            extract_public_key(&reparsed).unwrap_err(),
            KeyError::KeyUnavailable
        );
    }

    #[test]
    fn opaque_algorithm_cannot_export() {
        let key = PublicKey::Opaque {
            algorithm: ObjectIdentifier::new_unwrap("1.2.840.10040.4.1"),
            key: &[0u8; 4],
        };
        assert_eq!(export_bytes(&key).unwrap_err(), KeyError::ExportFailed);
    }

    #[test]
    fn compressed_point_on_foreign_curve_cannot_export() {
        let key = PublicKey::Ec {
            curve: ObjectIdentifier::new_unwrap("1.3.132.0.34"),
            point: &[
                0x02, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55,
            ],
        };
        assert_eq!(export_bytes(&key).unwrap_err(), KeyError::ExportFailed);
    }

    #[test]
    fn sec1_framing_rejects_nonsense() {
        assert!(check_sec1_framing(&[0x05, 0x01, 0x02]).is_err());
        assert!(check_sec1_framing(&[0x04]).is_err());
        assert!(check_sec1_framing(&[0x04, 0x01]).is_err());
        assert!(check_sec1_framing(&[0x04, 0x01, 0x02]).is_ok());
        assert!(check_sec1_framing(&[0x03, 0x01]).is_ok());
    }
}
