//! Bitcoin-compatible ECDSA over secp256k1.
//!
//! Signing is deterministic (RFC 6979, optionally randomized with extra
//! entropy), verification never panics on malformed input, and public
//! keys can be recovered from a signature plus a 2-bit recovery id.
//!
//! ```
//! use ecdsa_kit::Ecdsa;
//! use secp256kit::{nonce::ExtraEntropy, Point, Scalar};
//!
//! let ecdsa = Ecdsa::new();
//! let secret_key = Scalar::random(&mut rand::thread_rng());
//! let public_key = Point::from_secret_key(&secret_key).unwrap();
//! let msg_hash = [42u8; 32];
//! let signature = ecdsa
//!     .sign(&secret_key, &msg_hash, &ExtraEntropy::None)
//!     .unwrap();
//! assert!(ecdsa.verify(&public_key, &msg_hash, &signature));
//! ```
//!
//! Message hashes are accepted at any length and folded into the group as
//! `bits2int(h) mod n`. This matches RFC 6979 and differs deliberately
//! from BIP-340 Schnorr, which pins messages to exactly 32 bytes.

#![allow(non_snake_case)]

mod der;
mod signature;

pub use der::DerError;
pub use signature::{DerSignature, Signature};

pub use secp256kit;
use secp256kit::{
    double_mul_vartime,
    nonce::{ExtraEntropy, NonceHmac, Rfc6979, SyncHmac},
    Point, Scalar,
};

use core::fmt;

/// The 2-bit recovery id attached to a recoverable signature.
///
/// Bit 0 carries the parity of `R`'s y-coordinate; bit 1 is set in the
/// rare case that `R`'s x-coordinate overflowed the group order and was
/// reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryId(u8);

impl RecoveryId {
    /// Validates a raw id; only `0..=3` are meaningful.
    pub fn from_byte(id: u8) -> Option<Self> {
        (id < 4).then_some(Self(id))
    }

    /// The raw id byte.
    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// Whether `R.y` is odd.
    pub fn is_y_odd(self) -> bool {
        self.0 & 1 == 1
    }

    /// Whether `R.x` was reduced modulo the order.
    pub fn is_x_reduced(self) -> bool {
        self.0 & 2 == 2
    }
}

/// Ways signing can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignError {
    /// The secret scalar was zero.
    InvalidSecretKey,
    /// RFC 6979 ran out of retries without producing a usable nonce. With
    /// a correct HMAC this has negligible probability; treat it as a bug.
    NonceExhausted,
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignError::InvalidSecretKey => write!(f, "secret key is not in [1, n-1]"),
            SignError::NonceExhausted => write!(f, "deterministic nonce derivation exhausted"),
        }
    }
}

impl std::error::Error for SignError {}

/// An instance of the ECDSA signature scheme.
///
/// The nonce generator is injected so that a caller can substitute their
/// own HMAC primitive; [`Ecdsa::new`] wires up the RFC 6979 default.
#[derive(Clone, Debug)]
pub struct Ecdsa<H = SyncHmac> {
    nonce_gen: Rfc6979<H>,
    /// Whether the low-s rule ([BIP-146]) is applied: signing emits the
    /// canonical `s <= n/2` form and verification rejects the high twin.
    ///
    /// [BIP-146]: https://github.com/bitcoin/bips/blob/master/bip-0146.mediawiki#low_s
    enforce_low_s: bool,
}

impl Ecdsa<SyncHmac> {
    /// An instance with the default RFC 6979 nonce generator.
    pub fn new() -> Self {
        Ecdsa {
            nonce_gen: Rfc6979::new(),
            enforce_low_s: false,
        }
    }
}

impl Default for Ecdsa<SyncHmac> {
    fn default() -> Self {
        Self::new()
    }
}

impl Ecdsa<()> {
    /// An instance that can verify signatures but not produce them.
    pub fn verify_only() -> Self {
        Ecdsa {
            nonce_gen: Rfc6979::with_hmac(()),
            enforce_low_s: false,
        }
    }
}

impl<H> Ecdsa<H> {
    /// Turns on the low-s rule for both signing and verification.
    pub fn enforce_low_s(self) -> Self {
        Ecdsa {
            nonce_gen: self.nonce_gen,
            enforce_low_s: true,
        }
    }

    /// Verifies a signature over `msg_hash` under `public_key`.
    ///
    /// Malformed or degenerate inputs yield `false`, never a panic or an
    /// error: this is the boundary that adversarial data crosses.
    #[must_use]
    pub fn verify(&self, public_key: &Point, msg_hash: &[u8], signature: &Signature) -> bool {
        if bool::from(public_key.is_identity()) {
            return false;
        }
        if self.enforce_low_s && signature.is_high_s() {
            return false;
        }
        let e = Scalar::from_bytes_reduced(msg_hash);
        let s_inv = match signature.s.invert() {
            Some(inv) => inv,
            None => return false,
        };
        let u1 = e.mul(&s_inv);
        let u2 = signature.r.mul(&s_inv);
        let R = double_mul_vartime(&u1, &Point::BASE, &u2, public_key);
        if bool::from(R.is_identity()) {
            return false;
        }
        R.x_eq_scalar(&signature.r)
    }
}

impl<H: NonceHmac> Ecdsa<H> {
    /// Deterministically signs `msg_hash` with `secret`.
    ///
    /// `extra` feeds additional entropy into the nonce derivation;
    /// [`ExtraEntropy::None`] makes repeated calls byte-identical.
    pub fn sign(
        &self,
        secret: &Scalar,
        msg_hash: &[u8],
        extra: &ExtraEntropy,
    ) -> Result<Signature, SignError> {
        self.sign_recoverable(secret, msg_hash, extra)
            .map(|(signature, _)| signature)
    }

    /// Signs and additionally reports the recovery id for
    /// [`recover`].
    pub fn sign_recoverable(
        &self,
        secret: &Scalar,
        msg_hash: &[u8],
        extra: &ExtraEntropy,
    ) -> Result<(Signature, RecoveryId), SignError> {
        if bool::from(secret.is_zero()) {
            return Err(SignError::InvalidSecretKey);
        }
        let e = Scalar::from_bytes_reduced(msg_hash);

        let mut out: Option<(Signature, RecoveryId)> = None;
        // The RFC 6979 validator runs the signing equation on each nonce
        // candidate and rejects those that hit r = 0 or s = 0.
        self.nonce_gen
            .derive_nonce(secret, msg_hash, extra, |k| {
                let R = Point::BASE.mul(k);
                let (x_bytes, y_bytes) = match R.coordinates() {
                    Some(coords) => coords,
                    None => return false,
                };
                let r = Scalar::from_bytes_mod_order(x_bytes);
                if bool::from(r.is_zero()) {
                    return false;
                }
                // x >= n exactly when the strict parse fails.
                let x_overflow = Scalar::from_bytes(x_bytes).is_none();
                let k_inv = k
                    .invert()
                    .expect("derive_nonce only yields nonces in [1, n-1]");
                let mut s = k_inv.mul(&e.add(&r.mul(secret)));
                if bool::from(s.is_zero()) {
                    return false;
                }
                let mut rec = (y_bytes[31] & 1) | ((x_overflow as u8) << 1);
                if self.enforce_low_s && bool::from(s.is_high()) {
                    s = s.negate();
                    rec ^= 1;
                }
                out = Signature::from_scalars(r, s)
                    .map(|signature| (signature, RecoveryId(rec)));
                out.is_some()
            })
            .ok_or(SignError::NonceExhausted)?;
        out.ok_or(SignError::NonceExhausted)
    }
}

/// Recovers the public key that signed `msg_hash` from a signature and
/// its recovery id.
///
/// Returns `None` when the candidate `R.x` does not name a curve point or
/// the recovered key degenerates to the identity; both mean "no solution"
/// for well-formed inputs.
pub fn recover(msg_hash: &[u8], signature: &Signature, rec: RecoveryId) -> Option<Point> {
    let x_bytes = if rec.is_x_reduced() {
        // x = r + n. A carry past 2^256 cannot be a field element.
        let (sum, carry) = add_order(&signature.r.to_bytes());
        if carry {
            return None;
        }
        sum
    } else {
        signature.r.to_bytes()
    };
    let R = Point::lift_x(&x_bytes, rec.is_y_odd())?;

    let e = Scalar::from_bytes_reduced(msg_hash);
    let r_inv = signature
        .r
        .invert()
        .expect("signature components are in [1, n-1]");
    let u1 = e.negate().mul(&r_inv);
    let u2 = signature.s.mul(&r_inv);
    let Q = double_mul_vartime(&u1, &Point::BASE, &u2, &R);
    if bool::from(Q.is_identity()) {
        return None;
    }
    Some(Q)
}

/// Big-endian `value + n` with a carry flag.
fn add_order(value: &[u8; 32]) -> ([u8; 32], bool) {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    for i in (0..32).rev() {
        let sum = value[i] as u16 + secp256kit::curve::N[i] as u16 + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    (out, carry != 0)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::RngCore;

    fn keypair() -> (Scalar, Point) {
        let secret = Scalar::random(&mut rand::thread_rng());
        let public = Point::from_secret_key(&secret).unwrap();
        (secret, public)
    }

    #[test]
    fn repeated_sign_and_verify() {
        let ecdsa = Ecdsa::new();
        for _ in 0..10 {
            let mut msg_hash = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut msg_hash);
            let (secret, public) = keypair();
            let signature = ecdsa.sign(&secret, &msg_hash, &ExtraEntropy::None).unwrap();
            assert!(ecdsa.verify(&public, &msg_hash, &signature));
        }
    }

    #[test]
    fn signing_is_deterministic() {
        let ecdsa = Ecdsa::new();
        let (secret, _) = keypair();
        let msg_hash = [9u8; 32];
        let first = ecdsa.sign(&secret, &msg_hash, &ExtraEntropy::None).unwrap();
        let second = ecdsa.sign(&secret, &msg_hash, &ExtraEntropy::None).unwrap();
        assert_eq!(first, second);

        let randomized = ecdsa
            .sign(&secret, &msg_hash, &ExtraEntropy::Fixed([5; 32]))
            .unwrap();
        assert_ne!(first, randomized);
    }

    #[test]
    fn low_s() {
        let ecdsa = Ecdsa::new();
        let ecdsa_low_s = Ecdsa::new().enforce_low_s();
        for _ in 0..10 {
            let mut msg_hash = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut msg_hash);
            let (secret, public) = keypair();
            let sig = ecdsa_low_s
                .sign(&secret, &msg_hash, &ExtraEntropy::None)
                .unwrap();
            assert!(!sig.is_high_s());
            assert!(ecdsa.verify(&public, &msg_hash, &sig));
            assert!(ecdsa_low_s.verify(&public, &msg_hash, &sig));

            // The high twin still verifies without the rule, never with it.
            let high = Signature::from_scalars(*sig.r(), sig.s().negate()).unwrap();
            assert!(ecdsa.verify(&public, &msg_hash, &high));
            assert!(!ecdsa_low_s.verify(&public, &msg_hash, &high));
        }
    }

    #[test]
    fn verify_rejects_wrong_inputs() {
        let ecdsa = Ecdsa::verify_only();
        let signer = Ecdsa::new();
        let (secret, public) = keypair();
        let msg_hash = [1u8; 32];
        let signature = signer.sign(&secret, &msg_hash, &ExtraEntropy::None).unwrap();

        assert!(ecdsa.verify(&public, &msg_hash, &signature));
        assert!(!ecdsa.verify(&public, &[2u8; 32], &signature));
        let (_, other_public) = keypair();
        assert!(!ecdsa.verify(&other_public, &msg_hash, &signature));
        assert!(!ecdsa.verify(&Point::IDENTITY, &msg_hash, &signature));

        let tampered =
            Signature::from_scalars(signature.r().add(&Scalar::ONE), *signature.s()).unwrap();
        assert!(!ecdsa.verify(&public, &msg_hash, &tampered));
    }

    #[test]
    fn zero_secret_is_rejected() {
        let ecdsa = Ecdsa::new();
        assert_eq!(
            ecdsa.sign(&Scalar::ZERO, &[3u8; 32], &ExtraEntropy::None),
            Err(SignError::InvalidSecretKey)
        );
    }

    #[test]
    fn recovery_round_trip() {
        let ecdsa = Ecdsa::new();
        for _ in 0..10 {
            let mut msg_hash = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut msg_hash);
            let (secret, public) = keypair();
            let (signature, rec) = ecdsa
                .sign_recoverable(&secret, &msg_hash, &ExtraEntropy::None)
                .unwrap();
            assert_eq!(recover(&msg_hash, &signature, rec), Some(public));
        }
    }

    #[test]
    fn recovery_with_canonical_signatures() {
        let ecdsa = Ecdsa::new().enforce_low_s();
        let (secret, public) = keypair();
        let msg_hash = [7u8; 32];
        let (signature, rec) = ecdsa
            .sign_recoverable(&secret, &msg_hash, &ExtraEntropy::None)
            .unwrap();
        assert!(!signature.is_high_s());
        assert_eq!(recover(&msg_hash, &signature, rec), Some(public));
    }

    #[test]
    fn wrong_recovery_id_recovers_a_different_key() {
        let ecdsa = Ecdsa::new();
        let (secret, public) = keypair();
        let msg_hash = [8u8; 32];
        let (signature, rec) = ecdsa
            .sign_recoverable(&secret, &msg_hash, &ExtraEntropy::None)
            .unwrap();
        let flipped = RecoveryId::from_byte(rec.to_byte() ^ 1).unwrap();
        let recovered = recover(&msg_hash, &signature, flipped);
        assert_ne!(recovered, Some(public));
    }

    #[test]
    fn recovery_id_validation() {
        assert!(RecoveryId::from_byte(3).is_some());
        assert!(RecoveryId::from_byte(4).is_none());
        let rec = RecoveryId::from_byte(3).unwrap();
        assert!(rec.is_y_odd());
        assert!(rec.is_x_reduced());
    }

    #[test]
    fn long_message_hashes_reduce() {
        let ecdsa = Ecdsa::new();
        let (secret, public) = keypair();
        // 48-byte "hash": only the leftmost 32 bytes count.
        let mut long = [0u8; 48];
        rand::thread_rng().fill_bytes(&mut long);
        let signature = ecdsa.sign(&secret, &long, &ExtraEntropy::None).unwrap();
        assert!(ecdsa.verify(&public, &long, &signature));
        assert!(ecdsa.verify(&public, &long[..32], &signature));
    }
}
