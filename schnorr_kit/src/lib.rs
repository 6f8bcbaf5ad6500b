//! BIP-340 Schnorr signatures over secp256k1.
//!
//! Keys are x-only: a public key is the 32-byte x-coordinate of a point
//! whose y-coordinate is even, and secret keys are silently negated to
//! match. All hashing goes through the BIP-340 tagged-hash construction
//! with the `BIP0340/aux`, `BIP0340/nonce` and `BIP0340/challenge` tags.
//!
//! ```
//! use schnorr_kit::KeyPair;
//! use secp256kit::Scalar;
//!
//! let keypair = KeyPair::new(Scalar::random(&mut rand::thread_rng())).unwrap();
//! let msg = [42u8; 32];
//! let signature = schnorr_kit::sign_with_rng(&keypair, &msg, &mut rand::thread_rng()).unwrap();
//! assert!(schnorr_kit::verify(&signature, &msg, keypair.public_key()));
//! ```
//!
//! Messages are exactly 32 bytes (normally a hash). This is stricter than
//! the companion ECDSA crate, which accepts hashes of any length; the
//! asymmetry is BIP-340's, not ours.

#![allow(non_snake_case)]

mod signature;

pub use signature::Signature;

pub use secp256kit;
use secp256kit::{
    double_mul_vartime,
    hash::{finalize, tagged_hash, HashAdd},
    Point, Scalar, XOnly,
};

use core::fmt;
use rand_core::{CryptoRng, RngCore};

/// Ways signing can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignError {
    /// The derived nonce was zero. Probability ~2^-256: indicates broken
    /// hashing rather than bad luck.
    ZeroNonce,
    /// The freshly produced signature failed its own verification. Either
    /// the implementation or the inputs are corrupt; the signature must
    /// not be released.
    SelfVerifyFailed,
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignError::ZeroNonce => write!(f, "derived nonce was zero"),
            SignError::SelfVerifyFailed => write!(f, "freshly created signature did not verify"),
        }
    }
}

impl std::error::Error for SignError {}

/// A BIP-340 key pair.
///
/// The secret scalar is normalized at construction: if `[d]G` has an odd
/// y-coordinate the stored secret is `n - d`, so that the stored scalar
/// always lands exactly on the point the x-only public key names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPair {
    sk: Scalar,
    pk: XOnly,
}

impl KeyPair {
    /// Builds a key pair from a secret scalar. Returns `None` for zero,
    /// which is not a valid secret key.
    pub fn new(mut sk: Scalar) -> Option<Self> {
        let pk = XOnly::from_scalar_mul(&Point::BASE, &mut sk)?;
        Some(KeyPair { sk, pk })
    }

    /// The x-only public key.
    pub fn public_key(&self) -> &XOnly {
        &self.pk
    }

    /// The (normalized) secret scalar.
    pub fn secret_key(&self) -> &Scalar {
        &self.sk
    }
}

/// The Fiat-Shamir challenge `int(H_challenge(R.x || P.x || m)) mod n`.
fn challenge(rx: &[u8; 32], public_key: &XOnly, msg: &[u8; 32]) -> Scalar {
    Scalar::from_hash(
        tagged_hash(b"BIP0340/challenge")
            .add(rx)
            .add(public_key.as_bytes())
            .add(msg),
    )
}

/// Signs a 32-byte message with the given auxiliary randomness.
///
/// Passing a fixed `aux` makes the signature reproducible, which the
/// BIP-340 test vectors rely on; [`sign_with_rng`] is the everyday entry
/// point. The signature is verified before it is returned.
pub fn sign(keypair: &KeyPair, msg: &[u8; 32], aux: &[u8; 32]) -> Result<Signature, SignError> {
    let d = &keypair.sk;

    // Mask the secret with the hashed auxiliary randomness.
    let aux_hash = finalize(tagged_hash(b"BIP0340/aux").add(aux));
    let mut t = d.to_bytes();
    for (byte, mask) in t.iter_mut().zip(aux_hash.iter()) {
        *byte ^= mask;
    }

    let rand = finalize(
        tagged_hash(b"BIP0340/nonce")
            .add(&t)
            .add(keypair.pk.as_bytes())
            .add(msg),
    );
    let k0 = Scalar::from_bytes_mod_order(rand);
    if bool::from(k0.is_zero()) {
        return Err(SignError::ZeroNonce);
    }

    // Normalize the nonce to the even-y representative of R.
    let mut k = k0;
    let R = XOnly::from_scalar_mul(&Point::BASE, &mut k).ok_or(SignError::ZeroNonce)?;

    let e = challenge(R.as_bytes(), &keypair.pk, msg);
    let s = k.add(&e.mul(d));

    let signature = Signature::from_bytes({
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(R.as_bytes());
        bytes[32..].copy_from_slice(&s.to_bytes());
        bytes
    })
    .ok_or(SignError::SelfVerifyFailed)?;

    if !verify(&signature, msg, &keypair.pk) {
        return Err(SignError::SelfVerifyFailed);
    }
    Ok(signature)
}

/// Signs with 32 fresh random bytes of auxiliary randomness.
pub fn sign_with_rng<R: RngCore + CryptoRng>(
    keypair: &KeyPair,
    msg: &[u8; 32],
    rng: &mut R,
) -> Result<Signature, SignError> {
    let mut aux = [0u8; 32];
    rng.fill_bytes(&mut aux);
    sign(keypair, msg, &aux)
}

/// Verifies a signature over a 32-byte message under an x-only public
/// key.
///
/// Computes `R = [s]G - [e]P` and accepts iff `R` is not the identity,
/// has an even y-coordinate, and its x-coordinate equals the signature's
/// nonce coordinate.
#[must_use]
pub fn verify(signature: &Signature, msg: &[u8; 32], public_key: &XOnly) -> bool {
    let P = public_key.to_point();
    let rx = signature.rx_bytes();
    let e = challenge(&rx, public_key, msg);
    let R = double_mul_vartime(signature.s(), &Point::BASE, &e.negate(), &P);
    if bool::from(R.is_identity()) {
        return false;
    }
    if !R.is_y_even() {
        return false;
    }
    match R.coordinates() {
        Some((x, _)) => x == rx,
        None => false,
    }
}
