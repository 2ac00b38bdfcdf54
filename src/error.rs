use core::fmt;

/// Failure to interpret input bytes as a DER-encoded X.509 certificate.
#[derive(Clone, Debug)]
pub enum DecodeError {
    /// Input is not a valid DER X.509 structure: bad tag or length bytes,
    /// truncated input, trailing garbage, or BER quirks this crate does not
    /// tolerate. Carries the underlying ASN.1 error for diagnostics.
    Malformed(der::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(err) => write!(fmt, "malformed X.509 certificate: {}", err),
        }
    }
}

impl From<der::Error> for DecodeError {
    fn from(err: der::Error) -> Self {
        DecodeError::Malformed(err)
    }
}

/// A list of causes for which a subject public key cannot be derived or
/// exported from an otherwise well-formed certificate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyError {
    /// The key material does not evaluate as the algorithm the certificate
    /// declares, e.g. a point not on the curve or invalid PKCS#1 DER.
    EvaluationFailed,
    /// The subjectPublicKeyInfo bit string holds no byte-aligned key material.
    KeyUnavailable,
    /// No canonical export representation exists for the key's algorithm.
    ExportFailed,
}

impl KeyError {
    fn as_str(&self) -> &'static str {
        use KeyError::*;
        match self {
            EvaluationFailed => "public key does not evaluate as its declared algorithm",
            KeyUnavailable => "certificate holds no byte-aligned public key material",
            ExportFailed => "public key algorithm has no canonical export representation",
        }
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Pipeline error: the first failing stage for one certificate.
#[derive(Clone, Debug)]
pub enum PinError {
    /// The certificate bytes did not decode.
    Decode(DecodeError),
    /// The subject public key could not be derived or exported.
    Key(KeyError),
}

impl fmt::Display for PinError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::Decode(err) => write!(fmt, "{}", err),
            PinError::Key(err) => write!(fmt, "{}", err),
        }
    }
}

impl From<DecodeError> for PinError {
    fn from(err: DecodeError) -> Self {
        PinError::Decode(err)
    }
}

impl From<KeyError> for PinError {
    fn from(err: KeyError) -> Self {
        PinError::Key(err)
    }
}
