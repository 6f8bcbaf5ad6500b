//! Scalar arithmetic (integers modulo the secp256k1 group order).

use crate::limb::{add4, be_bytes_to_limbs, limbs_to_be_bytes, mul_wide, sub4};
use core::fmt;
use rand_core::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// The group order as little-endian limbs.
///
/// `n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141`
pub(crate) const N: [u64; 4] = [
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// `2^256 - n`, the 129-bit fold constant for wide reduction.
const N_C: [u64; 4] = [0x402D_A173_2FC9_BEBF, 0x4551_2319_50B7_5FC4, 0x1, 0x0];

/// `(n - 1) / 2`. Scalars above this bound are the "high" half used by the
/// low-s rule.
const HALF_N: [u64; 4] = [
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
];

/// `n - 2`, the Fermat inversion exponent.
const N_MINUS_2: [u64; 4] = [
    0xBFD2_5E8C_D036_413F,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// A secp256k1 scalar (an integer modulo the curve order `n`).
///
/// Scalars double as private keys: a valid key is any scalar in
/// `[1, n - 1]`. Parsing is strict by default ([`Scalar::from_bytes`]
/// rejects encodings of `n` or above); hash outputs are folded in with
/// [`Scalar::from_bytes_reduced`], which reduces instead of rejecting as
/// RFC 6979 and BIP-340 prescribe.
#[derive(Clone, Copy, Default)]
pub struct Scalar(pub(crate) [u64; 4]);

impl Scalar {
    /// The scalar `0`.
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    /// The scalar `1`.
    pub const ONE: Self = Self([1, 0, 0, 0]);

    /// Creates a scalar from 32 big-endian bytes, rejecting encodings that
    /// are not below the curve order.
    ///
    /// # Example
    /// ```
    /// use secp256kit::Scalar;
    /// assert!(Scalar::from_bytes([0u8; 32]).is_some());
    /// assert!(Scalar::from_bytes([0xFF; 32]).is_none());
    /// ```
    pub fn from_bytes(bytes: [u8; 32]) -> Option<Self> {
        let limbs = be_bytes_to_limbs(&bytes);
        let (_, borrow) = sub4(&limbs, &N);
        if borrow == 1 {
            Some(Self(limbs))
        } else {
            None
        }
    }

    /// Like [`from_bytes`] but for a slice, returning `None` when the slice
    /// is not exactly 32 bytes.
    ///
    /// [`from_bytes`]: Self::from_bytes
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 32] = slice.try_into().ok()?;
        Self::from_bytes(bytes)
    }

    /// Creates a scalar from 32 big-endian bytes, reducing modulo `n`.
    pub fn from_bytes_mod_order(bytes: [u8; 32]) -> Self {
        let limbs = be_bytes_to_limbs(&bytes);
        // The value is < 2^256 < 2n, so a single conditional subtraction
        // lands it in range.
        Self::reduce_once(limbs, 0)
    }

    /// `bits2int` of an arbitrary-length big-endian integer, reduced modulo
    /// `n`: the leftmost 256 bits are kept, shorter inputs are left-padded.
    ///
    /// This is how message hashes become scalars in ECDSA and RFC 6979.
    pub fn from_bytes_reduced(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 32];
        let take = bytes.len().min(32);
        buf[32 - take..].copy_from_slice(&bytes[..take]);
        Self::from_bytes_mod_order(buf)
    }

    /// Reduces a hash output modulo the curve order.
    pub fn from_hash(hash: sha2::Sha256) -> Self {
        use sha2::Digest;
        let digest: [u8; 32] = hash.finalize().into();
        Self::from_bytes_mod_order(digest)
    }

    /// Samples a uniform scalar in `[1, n - 1]` by rejection.
    ///
    /// # Example
    /// ```
    /// use secp256kit::Scalar;
    /// let secret_key = Scalar::random(&mut rand::thread_rng());
    /// assert!(!bool::from(secret_key.is_zero()));
    /// ```
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Some(scalar) = Self::from_bytes(bytes) {
                if !bool::from(scalar.is_zero()) {
                    return scalar;
                }
            }
        }
    }

    /// The 32-byte big-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        limbs_to_be_bytes(&self.0)
    }

    /// Whether the scalar is zero.
    pub fn is_zero(&self) -> Choice {
        self.ct_eq(&Self::ZERO)
    }

    /// Whether the scalar exceeds `n/2`. Signatures with a high `s` are
    /// the malleable twins the low-s rule forbids.
    pub fn is_high(&self) -> Choice {
        // HALF_N < self  <=>  HALF_N - self borrows.
        let (_, borrow) = sub4(&HALF_N, &self.0);
        Choice::from(borrow as u8)
    }

    fn reduce_once(limbs: [u64; 4], carry: u64) -> Self {
        let (d, borrow) = sub4(&limbs, &N);
        let needs_sub = Choice::from(carry as u8) | !Choice::from(borrow as u8);
        let mut out = [0u64; 4];
        for i in 0..4 {
            out[i] = u64::conditional_select(&limbs[i], &d[i], needs_sub);
        }
        Self(out)
    }

    /// `self + rhs mod n`.
    pub fn add(&self, rhs: &Self) -> Self {
        let (sum, carry) = add4(&self.0, &rhs.0);
        Self::reduce_once(sum, carry)
    }

    /// `self - rhs mod n`.
    pub fn sub(&self, rhs: &Self) -> Self {
        let (diff, borrow) = sub4(&self.0, &rhs.0);
        let (wrapped, _) = add4(&diff, &N);
        let mut out = [0u64; 4];
        for i in 0..4 {
            out[i] = u64::conditional_select(&diff[i], &wrapped[i], Choice::from(borrow as u8));
        }
        Self(out)
    }

    /// `n - self`, with `-0 = 0`.
    pub fn negate(&self) -> Self {
        let (neg, _) = sub4(&N, &self.0);
        let mut out = Self(neg);
        out.conditional_assign(&Self::ZERO, self.is_zero());
        out
    }

    /// Negates the scalar in place when `cond` is set.
    pub fn conditional_negate(&mut self, cond: Choice) {
        let negated = self.negate();
        self.conditional_assign(&negated, cond);
    }

    /// `self * rhs mod n`.
    pub fn mul(&self, rhs: &Self) -> Self {
        Self::reduce_wide(mul_wide(&self.0, &rhs.0))
    }

    /// Reduces a 512-bit product using `2^256 ≡ 2^256 - n (mod n)`.
    ///
    /// The fold constant is 129 bits, so three folds shrink any 512-bit
    /// value under `2^256 + 2^134`; the possible carry folds once more and
    /// a final conditional subtraction lands in `[0, n)`.
    fn reduce_wide(w: [u64; 8]) -> Self {
        fn split(w: &[u64; 8]) -> ([u64; 4], [u64; 4]) {
            ([w[0], w[1], w[2], w[3]], [w[4], w[5], w[6], w[7]])
        }
        fn add_wide(lo: &[u64; 4], rhs: &[u64; 8]) -> [u64; 8] {
            let mut out = *rhs;
            let mut carry = 0;
            for i in 0..4 {
                let (limb, c) = crate::limb::adc(out[i], lo[i], carry);
                out[i] = limb;
                carry = c;
            }
            for i in 4..8 {
                let (limb, c) = crate::limb::adc(out[i], 0, carry);
                out[i] = limb;
                carry = c;
            }
            debug_assert_eq!(carry, 0);
            out
        }

        let (lo, hi) = split(&w);
        let acc = add_wide(&lo, &mul_wide(&hi, &N_C));
        let (lo, hi) = split(&acc);
        let acc = add_wide(&lo, &mul_wide(&hi, &N_C));
        let (lo, hi) = split(&acc);
        let acc = add_wide(&lo, &mul_wide(&hi, &N_C));
        debug_assert_eq!(acc[5] | acc[6] | acc[7], 0);
        debug_assert!(acc[4] <= 1);

        // acc now fits in 257 bits: fold a possible bit 256 and reduce.
        let (folded, carry) = add4(
            &[acc[0], acc[1], acc[2], acc[3]],
            &[
                N_C[0] * acc[4],
                N_C[1] * acc[4],
                N_C[2] * acc[4],
                0,
            ],
        );
        debug_assert_eq!(carry, 0);
        Self::reduce_once(folded, 0)
    }

    /// The multiplicative inverse modulo `n` (Fermat), or `None` for zero.
    ///
    /// # Example
    /// ```
    /// use secp256kit::Scalar;
    /// let a = Scalar::random(&mut rand::thread_rng());
    /// assert_eq!(a.mul(&a.invert().unwrap()), Scalar::ONE);
    /// ```
    pub fn invert(&self) -> Option<Self> {
        let mut acc = Self::ONE;
        let mut base = *self;
        for limb in &N_MINUS_2 {
            for bit in 0..64 {
                if (limb >> bit) & 1 == 1 {
                    acc = acc.mul(&base);
                }
                base = base.mul(&base);
            }
        }
        if bool::from(self.is_zero()) {
            None
        } else {
            Some(acc)
        }
    }
}

impl From<u32> for Scalar {
    fn from(int: u32) -> Self {
        Self([int as u64, 0, 0, 0])
    }
}

impl ConditionallySelectable for Scalar {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut out = [0u64; 4];
        for i in 0..4 {
            out[i] = u64::conditional_select(&a.0[i], &b.0[i], choice);
        }
        Self(out)
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[0].ct_eq(&other.0[0])
            & self.0[1].ct_eq(&other.0[1])
            & self.0[2].ct_eq(&other.0[2])
            & self.0[3].ct_eq(&other.0[3])
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Scalar {}

impl crate::hash::HashInto for Scalar {
    fn hash_into(&self, hash: &mut impl digest::Digest) {
        hash.update(self.to_bytes())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::hex::encode(&self.to_bytes()))
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar({})", crate::hex::encode(&self.to_bytes()))
    }
}

impl core::str::FromStr for Scalar {
    type Err = crate::hex::HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = crate::hex::decode_array(s)?;
        Self::from_bytes(bytes).ok_or(crate::hex::HexError::InvalidEncoding)
    }
}
