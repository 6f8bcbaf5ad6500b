//! Points on the secp256k1 curve.

use crate::{field::FieldElement, hex, mul, scalar::Scalar, xonly::XOnly};
use core::fmt;
use rand_core::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

/// A point on the secp256k1 elliptic curve, including the point at
/// infinity.
///
/// Affine points `(x, y)` satisfy `y^2 = x^3 + 7` over the field of
/// integers modulo `p = 2^256 - 2^32 - 977`. Internally the point is held
/// in Jacobian coordinates `(X, Y, Z)` with `x = X/Z^2`, `y = Y/Z^3`; the
/// identity element is any triple with `Z = 0`. Operations never convert
/// back to affine until a caller asks for coordinates or an encoding, so
/// chains of group operations cost no field inversions.
///
/// The group law is evaluated branch-free: the general sum, the doubling
/// and the identity/inverse special cases are all computed and the right
/// one is picked by masked selection, so the flow of control does not
/// depend on the operands.
#[derive(Clone, Copy)]
pub struct Point {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
}

impl Point {
    /// The identity element (the point at infinity).
    pub const IDENTITY: Self = Point {
        x: FieldElement::ZERO,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    /// The base point `G` from [_SEC 2: Recommended Elliptic Curve Domain
    /// Parameters_].
    ///
    /// [_SEC 2: Recommended Elliptic Curve Domain Parameters_]: https://www.secg.org/sec2-v2.pdf
    pub const BASE: Self = Point {
        x: FieldElement([
            0x59F2_815B_16F8_1798,
            0x029B_FCDB_2DCE_28D9,
            0x55A0_6295_CE87_0B07,
            0x79BE_667E_F9DC_BBAC,
        ]),
        y: FieldElement([
            0x9C47_D08F_FB10_D4B8,
            0xFD17_B448_A685_5419,
            0x5DA4_FBFC_0E11_08A8,
            0x483A_DA77_26A3_C465,
        ]),
        z: FieldElement::ONE,
    };

    /// Whether this is the point at infinity.
    pub fn is_identity(&self) -> Choice {
        self.z.is_zero()
    }

    /// Decompresses an x-coordinate, choosing the root with the requested
    /// parity. Returns `None` when `x >= p` or `x^3 + 7` has no square
    /// root.
    pub fn lift_x(x_bytes: &[u8; 32], y_odd: bool) -> Option<Self> {
        let x = FieldElement::from_bytes(x_bytes)?;
        let y_sq = x.square().mul(&x).add(&FieldElement::B);
        let y = y_sq.sqrt()?;
        let y = if bool::from(y.is_odd()) == y_odd {
            y
        } else {
            y.negate()
        };
        Some(Point {
            x,
            y,
            z: FieldElement::ONE,
        })
    }

    /// Creates a point from the 33-byte compressed encoding specified in
    /// [_Standards for Efficient Cryptography_]: a `0x02`/`0x03` parity
    /// prefix followed by the x-coordinate.
    ///
    /// # Example
    /// ```
    /// use secp256kit::{Point, G};
    /// let bytes = [
    ///     2, 121, 190, 102, 126, 249, 220, 187, 172, 85, 160, 98, 149, 206, 135, 11, 7, 2, 155,
    ///     252, 219, 45, 206, 40, 217, 89, 242, 129, 91, 22, 248, 23, 152,
    /// ];
    /// assert_eq!(Point::from_bytes(bytes).unwrap(), *G);
    /// ```
    ///
    /// [_Standards for Efficient Cryptography_]: https://www.secg.org/sec1-v2.pdf
    pub fn from_bytes(bytes: [u8; 33]) -> Option<Self> {
        let y_odd = match bytes[0] {
            2 => false,
            3 => true,
            _ => return None,
        };
        let mut x = [0u8; 32];
        x.copy_from_slice(&bytes[1..]);
        Self::lift_x(&x, y_odd)
    }

    /// Creates a point from the 65-byte uncompressed encoding
    /// (`0x04 || x || y`). Both coordinates must be in range and on the
    /// curve.
    pub fn from_bytes_uncompressed(bytes: [u8; 65]) -> Option<Self> {
        if bytes[0] != 0x04 {
            return None;
        }
        let mut x_bytes = [0u8; 32];
        let mut y_bytes = [0u8; 32];
        x_bytes.copy_from_slice(&bytes[1..33]);
        y_bytes.copy_from_slice(&bytes[33..65]);
        let x = FieldElement::from_bytes(&x_bytes)?;
        let y = FieldElement::from_bytes(&y_bytes)?;
        let y_sq = x.square().mul(&x).add(&FieldElement::B);
        if y.square() != y_sq {
            return None;
        }
        Some(Point {
            x,
            y,
            z: FieldElement::ONE,
        })
    }

    /// Parses either SEC1 encoding based on the slice length (33 or 65
    /// bytes).
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        match slice.len() {
            33 => Self::from_bytes(slice.try_into().ok()?),
            65 => Self::from_bytes_uncompressed(slice.try_into().ok()?),
            _ => None,
        }
    }

    /// Parses a point from the hex form of either SEC1 encoding.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::HexError> {
        let bytes = hex::decode(hex_str)?;
        match bytes.len() {
            33 | 65 => Self::from_slice(&bytes).ok_or(hex::HexError::InvalidEncoding),
            _ => Err(hex::HexError::InvalidLength),
        }
    }

    /// The public key for a secret scalar, i.e. `[d]G`. Returns `None` for
    /// the zero scalar, which is not a valid secret key.
    pub fn from_secret_key(secret: &Scalar) -> Option<Self> {
        if bool::from(secret.is_zero()) {
            return None;
        }
        Some(Self::BASE.mul(secret))
    }

    /// Samples a point uniformly from the group.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 33];
        rng.fill_bytes(&mut bytes);
        bytes[0] &= 0x01;
        bytes[0] |= 0x02;
        Self::from_bytes(bytes).unwrap_or_else(|| Self::random(rng))
    }

    /// The affine coordinates as big-endian bytes, or `None` for the
    /// identity.
    pub fn coordinates(&self) -> Option<([u8; 32], [u8; 32])> {
        let (x, y) = self.to_affine()?;
        Some((x.to_bytes(), y.to_bytes()))
    }

    pub(crate) fn to_affine(&self) -> Option<(FieldElement, FieldElement)> {
        let z_inv = self.z.invert()?;
        let z_inv2 = z_inv.square();
        let x = self.x.mul(&z_inv2);
        let y = self.y.mul(&z_inv2).mul(&z_inv);
        Some((x, y))
    }

    /// The 33-byte compressed SEC1 encoding, or `None` for the identity.
    ///
    /// # Example
    /// ```
    /// use secp256kit::Point;
    /// let point = Point::random(&mut rand::thread_rng());
    /// let bytes = point.to_bytes().unwrap();
    /// assert!(bytes[0] == 0x02 || bytes[0] == 0x03);
    /// assert_eq!(Point::from_bytes(bytes).unwrap(), point);
    /// ```
    pub fn to_bytes(&self) -> Option<[u8; 33]> {
        let (x, y) = self.coordinates()?;
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02 | (y[31] & 0x01);
        bytes[1..].copy_from_slice(&x);
        Some(bytes)
    }

    /// The 65-byte uncompressed SEC1 encoding, or `None` for the identity.
    pub fn to_bytes_uncompressed(&self) -> Option<[u8; 65]> {
        let (x, y) = self.coordinates()?;
        let mut bytes = [0u8; 65];
        bytes[0] = 0x04;
        bytes[1..33].copy_from_slice(&x);
        bytes[33..65].copy_from_slice(&y);
        Some(bytes)
    }

    /// The BIP-340 x-only form of this point, or `None` for the identity.
    pub fn to_xonly(&self) -> Option<XOnly> {
        let (x, _) = self.coordinates()?;
        XOnly::from_bytes(x)
    }

    /// Whether the affine y-coordinate is even. The identity reports
    /// `true`.
    pub fn is_y_even(&self) -> bool {
        match self.to_affine() {
            Some((_, y)) => bool::from(y.is_even()),
            None => true,
        }
    }

    /// Whether the affine x-coordinate, reduced modulo the curve order,
    /// equals `scalar`. This comparison is the heart of ECDSA
    /// verification.
    pub fn x_eq_scalar(&self, scalar: &Scalar) -> bool {
        match self.coordinates() {
            Some((x, _)) => Scalar::from_bytes_mod_order(x) == *scalar,
            None => false,
        }
    }

    /// Doubles this point.
    pub fn double(&self) -> Self {
        // dbl-2009-l, a = 0.
        let a = self.x.square();
        let b = self.y.square();
        let c = b.square();
        let d = self.x.add(&b).square().sub(&a).sub(&c).double();
        let e = a.double().add(&a);
        let f = e.square();

        let x3 = f.sub(&d.double());
        let c8 = c.double().double().double();
        let y3 = e.mul(&d.sub(&x3)).sub(&c8);
        let z3 = self.y.mul(&self.z).double();

        let doubled = Point {
            x: x3,
            y: y3,
            z: z3,
        };
        Self::conditional_select(&doubled, &Self::IDENTITY, self.is_identity())
    }

    /// Adds two points.
    pub fn add(&self, other: &Self) -> Self {
        // add-2007-bl general sum.
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = self.x.mul(&z2z2);
        let u2 = other.x.mul(&z1z1);
        let s1 = self.y.mul(&other.z).mul(&z2z2);
        let s2 = other.y.mul(&self.z).mul(&z1z1);
        let h = u2.sub(&u1);
        let i = h.double().square();
        let j = h.mul(&i);
        let r = s2.sub(&s1).double();
        let v = u1.mul(&i);

        let x3 = r.square().sub(&j).sub(&v.double());
        let y3 = r.mul(&v.sub(&x3)).sub(&s1.mul(&j).double());
        let z3 = self.z.add(&other.z).square().sub(&z1z1).sub(&z2z2).mul(&h);

        let sum = Point {
            x: x3,
            y: y3,
            z: z3,
        };

        // The general formula collapses for equal or opposite inputs and
        // for the identity; evaluate those cases too and mask in the right
        // result.
        let doubled = self.double();
        let self_id = self.is_identity();
        let other_id = other.is_identity();
        let x_eq = u1.ct_eq(&u2);
        let y_eq = s1.ct_eq(&s2);
        let degenerate = x_eq & !self_id & !other_id;

        let mut out = sum;
        out.conditional_assign(&doubled, degenerate & y_eq);
        out.conditional_assign(&Self::IDENTITY, degenerate & !y_eq);
        out.conditional_assign(other, self_id);
        out.conditional_assign(self, other_id & !self_id);
        out
    }

    /// Subtracts `other` from this point.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    /// The additive inverse.
    pub fn negate(&self) -> Self {
        Point {
            x: self.x,
            y: self.y.negate(),
            z: self.z,
        }
    }

    /// Negates the point when `cond` is set.
    pub fn conditional_negate(&self, cond: Choice) -> Self {
        let mut out = *self;
        out.y.conditional_assign(&self.y.negate(), cond);
        out
    }

    /// Multiplies this point by a scalar.
    ///
    /// Multiplications by the base point go through its lazily built
    /// window table; other points use a cached table when one has been
    /// [precomputed](crate::precompute), or a transient one otherwise. The
    /// window loop's control flow and memory accesses are independent of
    /// the scalar.
    ///
    /// # Example
    /// ```
    /// use secp256kit::{Point, Scalar};
    /// let d = Scalar::random(&mut rand::thread_rng());
    /// let public_key = Point::BASE.mul(&d);
    /// assert!(!bool::from(public_key.is_identity()));
    /// ```
    pub fn mul(&self, scalar: &Scalar) -> Self {
        mul::mul(self, scalar)
    }

    fn ct_eq_point(&self, other: &Self) -> Choice {
        // Cross-multiply by the opposing z to compare without inverting:
        // X1/Z1^2 == X2/Z2^2  <=>  X1*Z2^2 == X2*Z1^2, same for y with
        // cubes.
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let x_eq = self.x.mul(&z2z2).ct_eq(&other.x.mul(&z1z1));
        let y_eq = self
            .y
            .mul(&z2z2.mul(&other.z))
            .ct_eq(&other.y.mul(&z1z1.mul(&self.z)));
        let self_id = self.is_identity();
        let other_id = other.is_identity();
        (self_id & other_id) | (!self_id & !other_id & x_eq & y_eq)
    }
}

impl ConditionallySelectable for Point {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Point {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

impl ConstantTimeEq for Point {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.ct_eq_point(other)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq_point(other).into()
    }
}

impl Eq for Point {}

impl core::ops::Add for &Point {
    type Output = Point;
    fn add(self, rhs: &Point) -> Point {
        Point::add(self, rhs)
    }
}

impl core::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::add(&self, &rhs)
    }
}

impl core::ops::Sub for &Point {
    type Output = Point;
    fn sub(self, rhs: &Point) -> Point {
        Point::sub(self, rhs)
    }
}

impl core::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::sub(&self, &rhs)
    }
}

impl core::ops::Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        self.negate()
    }
}

impl core::ops::Neg for &Point {
    type Output = Point;
    fn neg(self) -> Point {
        self.negate()
    }
}

impl core::ops::Mul<&Scalar> for &Point {
    type Output = Point;
    fn mul(self, rhs: &Scalar) -> Point {
        Point::mul(self, rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bytes() {
            Some(bytes) => f.write_str(&hex::encode(&bytes)),
            None => f.write_str("<point at infinity>"),
        }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    fn two_g() -> Point {
        Point::from_bytes_uncompressed(hex!(
            "04"
            "C6047F9441ED7D6D3045406E95C07CD85C778E4B8CEF3CA7ABAC09B95C709EE5"
            "1AE168FEA63DC339A3C58419466CEAEEF7F632653266D0E1236431A950CFE52A"
        ))
        .unwrap()
    }

    #[test]
    fn base_point_matches_sec2() {
        assert_eq!(
            Point::BASE.to_bytes_uncompressed().unwrap(),
            hex!(
                "04"
                "79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798"
                "483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8"
            )
        );
        assert_eq!(
            Point::BASE.to_bytes().unwrap(),
            hex!("0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798")
        );
    }

    #[test]
    fn doubling_and_addition_agree() {
        let g = Point::BASE;
        assert_eq!(g.double(), two_g());
        assert_eq!(g.add(&g), two_g());
        assert_eq!(g.add(&g), g.mul(&Scalar::from(2u32)));

        // 3G has the x-coordinate of the BIP-340 test key for d = 3.
        let three_g = two_g().add(&g);
        let (x, _) = three_g.coordinates().unwrap();
        assert_eq!(
            x,
            hex!("F9308A019258C31049344F85F89D5229B531C845836F99B08601F113BCE036F9")
        );
        assert_eq!(three_g, g.mul(&Scalar::from(3u32)));
    }

    #[test]
    fn identity_cases() {
        let g = Point::BASE;
        let id = Point::IDENTITY;
        assert!(bool::from(id.is_identity()));
        assert_eq!(id.add(&g), g);
        assert_eq!(g.add(&id), g);
        assert_eq!(id.add(&id), id);
        assert_eq!(g.add(&g.negate()), id);
        assert_eq!(g.sub(&g), id);
        assert_eq!(id.double(), id);
        assert_eq!(id.negate(), id);
        assert_eq!(g.mul(&Scalar::ZERO), id);
        assert!(id.to_bytes().is_none());
        assert!(id.coordinates().is_none());
    }

    #[test]
    fn negation_flips_parity() {
        let neg_g = Point::BASE.negate();
        assert_eq!(
            neg_g.to_bytes().unwrap(),
            hex!("0379BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798")
        );
        assert!(Point::BASE.is_y_even());
        assert!(!neg_g.is_y_even());
        assert_eq!(neg_g.add(&Point::BASE), Point::IDENTITY);
    }

    #[test]
    fn encoding_round_trips() {
        for _ in 0..8 {
            let point = Point::random(&mut rand::thread_rng());
            assert_eq!(Point::from_bytes(point.to_bytes().unwrap()).unwrap(), point);
            assert_eq!(
                Point::from_bytes_uncompressed(point.to_bytes_uncompressed().unwrap()).unwrap(),
                point
            );
        }
    }

    #[test]
    fn rejects_invalid_encodings() {
        let mut bad_prefix = Point::BASE.to_bytes().unwrap();
        bad_prefix[0] = 0x05;
        assert!(Point::from_bytes(bad_prefix).is_none());

        // x = p is out of range even though p mod p = 0.
        let mut oversized = [0u8; 33];
        oversized[0] = 0x02;
        oversized[1..].copy_from_slice(&hex!(
            "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F"
        ));
        assert!(Point::from_bytes(oversized).is_none());

        // A y that is not on the curve.
        let mut off_curve = Point::BASE.to_bytes_uncompressed().unwrap();
        off_curve[64] ^= 0x01;
        assert!(Point::from_bytes_uncompressed(off_curve).is_none());

        assert!(Point::from_slice(&[0u8; 32]).is_none());
    }

    #[test]
    fn scalar_mul_laws() {
        let g = Point::BASE;
        let five_g = g.mul(&Scalar::from(5u32));
        let sum = g.add(&g).add(&g).add(&g).add(&g);
        assert_eq!(five_g, sum);

        // [k]([m]G) = [k*m]G
        let k = Scalar::from(11u32);
        let m = Scalar::from(13u32);
        assert_eq!(g.mul(&m).mul(&k), g.mul(&k.mul(&m)));

        // [n-1]G = -G
        let n_minus_one = Scalar::ZERO.sub(&Scalar::ONE);
        assert_eq!(g.mul(&n_minus_one), g.negate());
        // [n]G = O, exercised as [n-1]G + G
        assert_eq!(g.mul(&n_minus_one).add(&g), Point::IDENTITY);
    }

    #[test]
    fn from_hex_parses_both_encodings() {
        let compressed = Point::from_hex(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        )
        .unwrap();
        assert_eq!(compressed, Point::BASE);
        assert!(Point::from_hex("02deadbeef").is_err());
        assert!(Point::from_hex("not hex at all!").is_err());
    }
}
