//! Key digests and their textual renderings, plus the composed pipeline.
//!
//! The digest stage is total: any byte sequence hashes to a 32-byte
//! [`KeyDigest`], renderable as 64 lowercase hex characters or 44 characters
//! of standard padded base64. SHA-256 is the default; any other 256-bit
//! digest implementation can be injected through [`KeyDigest::compute_with`].

use core::fmt;

use crate::error::PinError;
use crate::key;
use crate::x509;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use digest::{Digest, Output};
use heapless::String;
use sha2::Sha256;

/// Digest size in bytes.
pub const DIGEST_LEN: usize = 32;
/// Length of the hex rendering: two characters per digest byte.
pub const HEX_LEN: usize = DIGEST_LEN * 2;
/// Length of the padded base64 rendering of 32 bytes.
pub const BASE64_LEN: usize = 44;

/// SHA-256 digest of a public key's exported bytes. This is the pin value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyDigest([u8; DIGEST_LEN]);

impl KeyDigest {
    /// Hash exported key bytes with the default algorithm, SHA-256.
    pub fn compute(key_bytes: &[u8]) -> Self {
        Self::compute_with::<Sha256>(key_bytes)
    }

    /// Hash exported key bytes with a caller-chosen 256-bit digest.
    pub fn compute_with<D>(key_bytes: &[u8]) -> Self
    where
        D: Digest,
        Output<D>: Into<[u8; DIGEST_LEN]>,
    {
        Self(D::digest(key_bytes).into())
    }

    /// Wrap an existing digest value, e.g. a stored pin to compare against.
    pub fn from_bytes(raw: [u8; DIGEST_LEN]) -> Self {
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, two characters per byte, no separators.
    pub fn hex(&self) -> String<HEX_LEN> {
        let mut raw = [0u8; HEX_LEN];
        // exact fit, two output characters per digest byte
        hex::encode_to_slice(&self.0, &mut raw).ok();
        ascii_string(&raw)
    }

    /// Standard base64 rendering with `=` padding (RFC 4648 section 4).
    pub fn base64(&self) -> String<BASE64_LEN> {
        let mut raw = [0u8; BASE64_LEN];
        // exact fit, 44 output characters for 32 input bytes
        STANDARD.encode_slice(&self.0, &mut raw).ok();
        ascii_string(&raw)
    }
}

impl AsRef<[u8]> for KeyDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeyDigest {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.hex().as_str())
    }
}

/// Collect an ASCII buffer into a fixed-capacity string.
fn ascii_string<const N: usize>(raw: &[u8; N]) -> String<N> {
    let mut out = String::new();
    for &c in raw.iter() {
        // capacity equals the buffer length, the push cannot fail
        out.push(c as char).ok();
    }
    out
}

/// Run one certificate through decode, key extraction, export and digest.
///
/// Stops at the first failing stage. Both text forms are obtained from the
/// returned digest.
pub fn pin(blob: &[u8]) -> Result<KeyDigest, PinError> {
    let cert = x509::decode(blob)?;
    let key = key::extract_public_key(&cert)?;
    let exported = key::export_bytes(&key)?;
    debug!("pinning {} exported key bytes", exported.as_ref().len());
    Ok(KeyDigest::compute(exported.as_ref()))
}

/// Pin a batch of certificates, one independent result per input, in input
/// order. A malformed certificate fails alone without affecting the rest.
pub fn pin_all<'a, I>(blobs: I) -> impl Iterator<Item = Result<KeyDigest, PinError>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    blobs.into_iter().map(pin)
}
