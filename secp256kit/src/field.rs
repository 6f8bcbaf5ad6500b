//! Arithmetic modulo the field prime `p = 2^256 - 2^32 - 977`.

use crate::limb::{add4, adc, be_bytes_to_limbs, limbs_to_be_bytes, mul_wide, sub4};
use core::fmt;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// The field prime as little-endian limbs.
pub(crate) const P: [u64; 4] = [
    0xFFFF_FFFE_FFFF_FC2F,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// `2^256 mod p`. The fold constant for reducing wide products.
const C: u64 = 0x1_0000_03D1;

/// An element of the coordinate field of secp256k1.
///
/// Elements are kept **fully reduced** into `[0, p)` at every step. There is
/// no lazy normalization; every operation returns a canonical value. The
/// representation is four little-endian 64-bit limbs.
#[derive(Clone, Copy, Default)]
pub struct FieldElement(pub(crate) [u64; 4]);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    /// The multiplicative identity.
    pub const ONE: Self = Self([1, 0, 0, 0]);
    /// The curve equation constant `b = 7`.
    pub(crate) const B: Self = Self([7, 0, 0, 0]);

    /// Parses 32 big-endian bytes. Returns `None` if the integer is not
    /// below the field prime.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let limbs = be_bytes_to_limbs(bytes);
        let (_, borrow) = sub4(&limbs, &P);
        if borrow == 1 {
            Some(Self(limbs))
        } else {
            None
        }
    }

    /// The 32-byte big-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        limbs_to_be_bytes(&self.0)
    }

    /// Whether this element is zero.
    pub fn is_zero(&self) -> Choice {
        self.ct_eq(&Self::ZERO)
    }

    /// Whether the canonical representative is odd.
    pub fn is_odd(&self) -> Choice {
        Choice::from((self.0[0] & 1) as u8)
    }

    /// Whether the canonical representative is even.
    pub fn is_even(&self) -> Choice {
        !self.is_odd()
    }

    /// Reduces `carry * 2^256 + limbs` (known to be `< 2p`) into `[0, p)`.
    fn reduce_once(limbs: [u64; 4], carry: u64) -> Self {
        let (d, borrow) = sub4(&limbs, &P);
        // Subtract p when the value overflowed 2^256 or still reaches p.
        let needs_sub = Choice::from(carry as u8) | !Choice::from(borrow as u8);
        let mut out = [0u64; 4];
        for i in 0..4 {
            out[i] = u64::conditional_select(&limbs[i], &d[i], needs_sub);
        }
        Self(out)
    }

    /// `self + rhs mod p`.
    pub fn add(&self, rhs: &Self) -> Self {
        let (sum, carry) = add4(&self.0, &rhs.0);
        Self::reduce_once(sum, carry)
    }

    /// `2 * self mod p`.
    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// `self - rhs mod p`.
    pub fn sub(&self, rhs: &Self) -> Self {
        let (diff, borrow) = sub4(&self.0, &rhs.0);
        let (wrapped, _) = add4(&diff, &P);
        let mut out = [0u64; 4];
        for i in 0..4 {
            out[i] = u64::conditional_select(&diff[i], &wrapped[i], Choice::from(borrow as u8));
        }
        Self(out)
    }

    /// `p - self`, with `-0 = 0`.
    pub fn negate(&self) -> Self {
        let (neg, _) = sub4(&P, &self.0);
        let mut out = Self(neg);
        out.conditional_assign(&Self::ZERO, self.is_zero());
        out
    }

    /// `self * rhs mod p`.
    pub fn mul(&self, rhs: &Self) -> Self {
        Self::reduce_wide(mul_wide(&self.0, &rhs.0))
    }

    /// `self * self mod p`.
    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Reduces a 512-bit product using `2^256 ≡ C (mod p)`.
    fn reduce_wide(w: [u64; 8]) -> Self {
        // First fold: r = lo + hi * C. hi * C < 2^297, so the running carry
        // stays far below 2^64.
        let mut r = [0u64; 4];
        let mut carry: u128 = 0;
        for i in 0..4 {
            let v = (w[i] as u128) + (w[i + 4] as u128) * (C as u128) + carry;
            r[i] = v as u64;
            carry = v >> 64;
        }
        // Second fold: the leftover carry (< 2^34) folds into the low limb.
        let v = (r[0] as u128) + carry * (C as u128);
        r[0] = v as u64;
        let mut k = (v >> 64) as u64;
        for i in 1..4 {
            let (limb, c) = adc(r[i], 0, k);
            r[i] = limb;
            k = c;
        }
        // A carry out of the second fold means the value wrapped 2^256 and
        // is now tiny; folding C in once more cannot carry again.
        let v = (r[0] as u128) + (k as u128) * (C as u128);
        r[0] = v as u64;
        let mut k = (v >> 64) as u64;
        for i in 1..4 {
            let (limb, c) = adc(r[i], 0, k);
            r[i] = limb;
            k = c;
        }
        debug_assert_eq!(k, 0);
        Self::reduce_once(r, 0)
    }

    /// Raises to the power `2^k` by repeated squaring.
    fn pow2k(&self, k: usize) -> Self {
        let mut x = *self;
        for _ in 0..k {
            x = x.square();
        }
        x
    }

    /// Raises to an arbitrary power. The exponent is public.
    pub fn pow(&self, exp: &[u64; 4]) -> Self {
        let mut acc = Self::ONE;
        let mut base = *self;
        for limb in exp {
            for bit in 0..64 {
                if (limb >> bit) & 1 == 1 {
                    acc = acc.mul(&base);
                }
                base = base.square();
            }
        }
        acc
    }

    /// The multiplicative inverse via Fermat (`self^(p-2)`), or `None` for
    /// zero.
    ///
    /// The binary expansion of `p - 2` has 5 blocks of 1-bits with lengths
    /// in `{1, 2, 22, 223}`; the addition chain below builds `2^n - 1` for
    /// each block and stitches them with a sliding window.
    pub fn invert(&self) -> Option<Self> {
        let x2 = self.pow2k(1).mul(self);
        let x3 = x2.pow2k(1).mul(self);
        let x6 = x3.pow2k(3).mul(&x3);
        let x9 = x6.pow2k(3).mul(&x3);
        let x11 = x9.pow2k(2).mul(&x2);
        let x22 = x11.pow2k(11).mul(&x11);
        let x44 = x22.pow2k(22).mul(&x22);
        let x88 = x44.pow2k(44).mul(&x44);
        let x176 = x88.pow2k(88).mul(&x88);
        let x220 = x176.pow2k(44).mul(&x44);
        let x223 = x220.pow2k(3).mul(&x3);

        let r = x223
            .pow2k(23)
            .mul(&x22)
            .pow2k(5)
            .mul(self)
            .pow2k(3)
            .mul(&x2)
            .pow2k(2)
            .mul(self);

        if bool::from(self.is_zero()) {
            None
        } else {
            Some(r)
        }
    }

    /// The square root, when one exists.
    ///
    /// `p ≡ 3 (mod 4)`, so a root of a quadratic residue is
    /// `self^((p+1)/4)`; squaring the candidate tells residues and
    /// non-residues apart.
    pub fn sqrt(&self) -> Option<Self> {
        let x2 = self.pow2k(1).mul(self);
        let x3 = x2.pow2k(1).mul(self);
        let x6 = x3.pow2k(3).mul(&x3);
        let x9 = x6.pow2k(3).mul(&x3);
        let x11 = x9.pow2k(2).mul(&x2);
        let x22 = x11.pow2k(11).mul(&x11);
        let x44 = x22.pow2k(22).mul(&x22);
        let x88 = x44.pow2k(44).mul(&x44);
        let x176 = x88.pow2k(88).mul(&x88);
        let x220 = x176.pow2k(44).mul(&x44);
        let x223 = x220.pow2k(3).mul(&x3);

        let r = x223.pow2k(23).mul(&x22).pow2k(6).mul(&x2).pow2k(2);

        if bool::from(r.square().ct_eq(self)) {
            Some(r)
        } else {
            None
        }
    }
}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut out = [0u64; 4];
        for i in 0..4 {
            out[i] = u64::conditional_select(&a.0[i], &b.0[i], choice);
        }
        Self(out)
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[0].ct_eq(&other.0[0])
            & self.0[1].ct_eq(&other.0[1])
            & self.0[2].ct_eq(&other.0[2])
            & self.0[3].ct_eq(&other.0[3])
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FieldElement {}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", crate::hex::encode(&self.to_bytes()))
    }
}
