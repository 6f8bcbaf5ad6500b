//! The 64-byte BIP-340 signature.

use core::fmt;
use secp256kit::{hex, FieldElement, Scalar};

/// A BIP-340 Schnorr signature: `R.x || s`.
///
/// `R.x` is a field element in `[0, p)` — the x-coordinate of the public
/// nonce — and `s` is a scalar in `[0, n)`. Parsing enforces exactly those
/// ranges and nothing more; whether `R.x` lifts to a point is decided
/// during verification, as BIP-340 prescribes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub(crate) rx: FieldElement,
    pub(crate) s: Scalar,
}

impl Signature {
    /// Parses the 64-byte encoding. Returns `None` when the nonce
    /// x-coordinate is not below the field prime or `s` is not below the
    /// group order.
    pub fn from_bytes(bytes: [u8; 64]) -> Option<Self> {
        let mut rx = [0u8; 32];
        rx.copy_from_slice(&bytes[..32]);
        let mut s = [0u8; 32];
        s.copy_from_slice(&bytes[32..]);
        Some(Signature {
            rx: FieldElement::from_bytes(&rx)?,
            s: Scalar::from_bytes(s)?,
        })
    }

    /// Like [`from_bytes`] for slices; `None` unless exactly 64 bytes.
    ///
    /// [`from_bytes`]: Self::from_bytes
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 64] = slice.try_into().ok()?;
        Self::from_bytes(bytes)
    }

    /// The 64-byte encoding: the 32-byte nonce x-coordinate, then the
    /// 32-byte response scalar.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.rx.to_bytes());
        bytes[32..].copy_from_slice(&self.s.to_bytes());
        bytes
    }

    /// The nonce x-coordinate bytes.
    pub fn rx_bytes(&self) -> [u8; 32] {
        self.rx.to_bytes()
    }

    /// The response scalar.
    pub fn s(&self) -> &Scalar {
        &self.s
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.to_bytes()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl core::str::FromStr for Signature {
    type Err = hex::HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode_array(s)?;
        Self::from_bytes(bytes).ok_or(hex::HexError::InvalidEncoding)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn round_trip() {
        let bytes = hex!(
            "E907831F80848D1069A5371B402410364BDF1C5F8307B0084C55F1CE2DCA8215"
            "25F66A4A85EA8B71E482A74F382D2CE5EBEEE8FDB2172F477DF4900D310536C0"
        );
        let sig = Signature::from_bytes(bytes).unwrap();
        assert_eq!(sig.to_bytes(), bytes);
    }

    #[test]
    fn range_checks() {
        // s = n is out of range.
        let mut bytes = [0u8; 64];
        bytes[32..].copy_from_slice(&secp256kit::curve::N);
        assert!(Signature::from_bytes(bytes).is_none());

        // r = p is out of range.
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&secp256kit::curve::P);
        assert!(Signature::from_bytes(bytes).is_none());

        // All-zero is in range for both halves (r = 0, s = 0).
        assert!(Signature::from_bytes([0u8; 64]).is_some());
        assert!(Signature::from_slice(&[0u8; 63]).is_none());
    }
}
