//! Pinning digests for the subject public key of X.509 certificates.
//!
//! Feed a DER-encoded certificate to [`pin()`] and get back the SHA-256 digest
//! of its subject public key in the key's external export representation,
//! renderable as lowercase hex or padded base64. Clients embed those values
//! and compare them against the server key at handshake time, independent of
//! certificate renewal.
#![cfg_attr(not(test), no_std)]
mod fmt;

pub mod error;
pub mod key;
pub mod pin;
pub mod x509;

pub use error::{DecodeError, KeyError, PinError};
pub use key::{export_bytes, extract_public_key, KeyBytes, PublicKey};
pub use pin::{pin, pin_all, KeyDigest};
pub use x509::{decode, Certificate};
