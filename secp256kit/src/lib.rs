//! A self-contained implementation of the secp256k1 elliptic curve.
//!
//! `secp256kit` provides the arithmetic stack that the companion crates
//! [`ecdsa_kit`] and [`schnorr_kit`] build signatures on:
//!
//! - field and scalar arithmetic over 4x64-bit limbs, fully reduced at
//!   every step,
//! - the curve group law in Jacobian coordinates with branch-free special
//!   cases,
//! - windowed scalar multiplication with a lazily built, write-once base
//!   point table and a per-point precomputation cache,
//! - RFC 6979 deterministic nonces over an injected HMAC-SHA-256
//!   capability,
//! - SEC1 compressed/uncompressed and BIP-340 x-only encodings, and ECDH.
//!
//! ```
//! use secp256kit::{Point, Scalar, G};
//! let secret_key = Scalar::random(&mut rand::thread_rng());
//! let public_key = G.mul(&secret_key);
//! let compressed = public_key.to_bytes().unwrap();
//! assert_eq!(Point::from_bytes(compressed).unwrap(), public_key);
//! ```
//!
//! [`ecdsa_kit`]: https://docs.rs/ecdsa_kit
//! [`schnorr_kit`]: https://docs.rs/schnorr_kit

#![allow(non_snake_case)]
#![deny(missing_docs)]

pub mod ecdh;
pub mod hash;
pub mod hex;
pub mod nonce;

mod field;
mod limb;
mod mul;
mod point;
mod scalar;
mod xonly;

pub use field::FieldElement;
pub use mul::{double_mul_vartime, precompute, PointTable};
pub use point::Point;
pub use scalar::Scalar;
pub use xonly::XOnly;

pub use digest;
pub use rand_core;
pub use subtle;

/// The secp256k1 base point, as specified in [_SEC 2: Recommended Elliptic
/// Curve Domain Parameters_] and used in Bitcoin.
///
/// ```
/// use secp256kit::G;
/// assert_eq!(
///     format!("{}", G),
///     "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
/// );
/// ```
///
/// [_SEC 2: Recommended Elliptic Curve Domain Parameters_]: https://www.secg.org/sec2-v2.pdf
pub static G: &Point = &Point::BASE;

/// The fixed domain parameters of secp256k1.
pub mod curve {
    /// The field prime `p = 2^256 - 2^32 - 977`, big-endian.
    pub const P: [u8; 32] = [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF,
        0xFC, 0x2F,
    ];

    /// The (prime) group order `n`, big-endian.
    pub const N: [u8; 32] = [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
        0x41, 0x41,
    ];

    /// The curve equation constant in `y^2 = x^3 + B`.
    pub const B: u64 = 7;

    /// The cofactor. secp256k1 is a prime-order curve.
    pub const H: u64 = 1;
}
