//! The 32-byte x-only point representation used by BIP-340.

use crate::{hex, point::Point, scalar::Scalar};
use core::fmt;
use subtle::Choice;

/// An `XOnly` is the x-coordinate of a curve point whose y-coordinate is
/// even, stored as 32 big-endian bytes.
///
/// BIP-340 public keys are `XOnly` values: of the two points sharing an
/// x-coordinate, the even-`y` one is implied. Construction validates that
/// the coordinate actually lifts to a point, so every `XOnly` in
/// circulation decompresses successfully.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct XOnly([u8; 32]);

impl XOnly {
    /// Converts a 32-byte big-endian x-coordinate into an `XOnly`. Returns
    /// `None` if the bytes do not name a point on the curve.
    ///
    /// # Example
    /// ```
    /// use secp256kit::XOnly;
    /// // x = 1 is on the curve
    /// let mut one = [0u8; 32];
    /// one[31] = 1;
    /// assert!(XOnly::from_bytes(one).is_some());
    /// ```
    pub fn from_bytes(bytes: [u8; 32]) -> Option<Self> {
        Point::lift_x(&bytes, false).map(|_| Self(bytes))
    }

    /// Convenience wrapper over [`from_bytes`] for slices; `None` unless
    /// the slice is exactly 32 bytes.
    ///
    /// [`from_bytes`]: Self::from_bytes
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 32] = slice.try_into().ok()?;
        Self::from_bytes(bytes)
    }

    /// Parses an x-only point from 64 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::HexError> {
        let bytes = hex::decode_array(hex_str)?;
        Self::from_bytes(bytes).ok_or(hex::HexError::InvalidEncoding)
    }

    /// A reference to the raw 32-byte coordinate.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Consumes the `XOnly` and returns the coordinate bytes.
    pub fn into_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Decompresses to the curve point with an even y-coordinate.
    pub fn to_point(&self) -> Point {
        Point::lift_x(&self.0, false).expect("x-only coordinates are validated on construction")
    }

    /// Multiplies `base` by `x` and compresses the result to an `XOnly`.
    ///
    /// The scalar is negated in place when the product has an odd
    /// y-coordinate, so that afterwards `[x]base` is exactly the point the
    /// returned `XOnly` names. This is the key-normalization step of
    /// BIP-340 signing. Returns `None` when the product is the identity
    /// (zero scalar or identity base).
    pub fn from_scalar_mul(base: &Point, x: &mut Scalar) -> Option<Self> {
        let product = base.mul(x);
        let (x_bytes, y_bytes) = product.coordinates()?;
        let y_odd = y_bytes[31] & 1 == 1;
        x.conditional_negate(Choice::from(y_odd as u8));
        Some(Self(x_bytes))
    }
}

impl fmt::Display for XOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for XOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XOnly({})", self)
    }
}

impl core::str::FromStr for XOnly {
    type Err = hex::HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
