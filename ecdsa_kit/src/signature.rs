//! The ECDSA signature type and its wire codecs.

use crate::der::{self, DerError};
use core::fmt;
use secp256kit::{hex, Scalar};

/// An ECDSA signature `(r, s)`.
///
/// Both components are guaranteed to lie in `[1, n-1]`; constructors
/// refuse anything else. Note that without the low-s rule a signature and
/// its twin `(r, n-s)` verify equally — see [`Signature::normalize_s`] and
/// [`Ecdsa::enforce_low_s`](crate::Ecdsa::enforce_low_s).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub(crate) r: Scalar,
    pub(crate) s: Scalar,
}

impl Signature {
    /// Assembles a signature, rejecting zero components.
    pub fn from_scalars(r: Scalar, s: Scalar) -> Option<Self> {
        if bool::from(r.is_zero()) || bool::from(s.is_zero()) {
            return None;
        }
        Some(Signature { r, s })
    }

    /// The `r` component.
    pub fn r(&self) -> &Scalar {
        &self.r
    }

    /// The `s` component.
    pub fn s(&self) -> &Scalar {
        &self.s
    }

    /// Parses the 64-byte `r || s` compact form. Both halves must be
    /// canonical scalars in `[1, n-1]`.
    pub fn from_compact(bytes: [u8; 64]) -> Option<Self> {
        let r = Scalar::from_slice(&bytes[..32])?;
        let s = Scalar::from_slice(&bytes[32..])?;
        Self::from_scalars(r, s)
    }

    /// The 64-byte `r || s` compact form.
    pub fn to_compact(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r.to_bytes());
        bytes[32..].copy_from_slice(&self.s.to_bytes());
        bytes
    }

    /// Parses a strict DER `SEQUENCE { INTEGER r, INTEGER s }`.
    pub fn from_der(bytes: &[u8]) -> Result<Self, DerError> {
        let (r_bytes, s_bytes) = der::parse(bytes)?;
        let r = Scalar::from_bytes(r_bytes).ok_or(DerError::ScalarOutOfRange)?;
        let s = Scalar::from_bytes(s_bytes).ok_or(DerError::ScalarOutOfRange)?;
        Self::from_scalars(r, s).ok_or(DerError::ScalarOutOfRange)
    }

    /// Serializes to minimal DER.
    pub fn to_der(&self) -> DerSignature {
        let mut buf = [0u8; 72];
        let len = der::serialize(&self.r.to_bytes(), &self.s.to_bytes(), &mut buf);
        DerSignature { buf, len }
    }

    /// Whether `s` is in the high half of the group, i.e. the malleable
    /// form the low-s rule rejects.
    pub fn is_high_s(&self) -> bool {
        self.s.is_high().into()
    }

    /// The canonical low-s twin of this signature. Verifies for exactly
    /// the same messages and keys.
    pub fn normalize_s(&self) -> Self {
        if self.is_high_s() {
            Signature {
                r: self.r,
                s: self.s.negate(),
            }
        } else {
            *self
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.to_compact()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl core::str::FromStr for Signature {
    type Err = hex::HexError;

    /// Parses the hex form of the 64-byte compact encoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode_array(s)?;
        Self::from_compact(bytes).ok_or(hex::HexError::InvalidEncoding)
    }
}

/// An owned, minimally encoded DER signature (at most 72 bytes).
#[derive(Clone, Copy)]
pub struct DerSignature {
    buf: [u8; 72],
    len: usize,
}

impl DerSignature {
    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// The encoded length in bytes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }
}

impl AsRef<[u8]> for DerSignature {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for DerSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl fmt::Debug for DerSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerSignature({})", self)
    }
}
