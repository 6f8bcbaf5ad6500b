//! Deterministic nonce derivation per RFC 6979.
//!
//! Nonce generation is the easiest place to destroy a discrete-log
//! signature scheme: a biased or repeated nonce leaks the secret key. This
//! module implements the RFC 6979 HMAC-DRBG construction so that the nonce
//! is a deterministic, uniform-looking function of the secret key and the
//! message, with optional extra entropy for defense in depth.
//!
//! The HMAC-SHA-256 primitive is injected as a capability rather than
//! hard-wired: [`Rfc6979`] is generic over [`NonceHmac`] and ships with
//! [`SyncHmac`], the [`hmac`] crate's implementation.

use crate::scalar::Scalar;
use hmac::{Hmac, Mac};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;

/// How many candidate nonces to try before giving up.
///
/// A single retry already has probability ~2^-128; exhausting the bound
/// signals a broken HMAC implementation, not bad luck.
const MAX_TRIES: usize = 256;

/// The injected HMAC-SHA-256 capability.
///
/// `parts` are concatenated into the MAC input. Implementations must be
/// deterministic; everything else about RFC 6979 falls out of that.
pub trait NonceHmac {
    /// Computes `HMAC-SHA256(key, parts[0] || parts[1] || ...)`.
    fn hmac_sha256(&self, key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32];
}

/// The default [`NonceHmac`]: `Hmac<Sha256>` from the RustCrypto `hmac`
/// crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncHmac;

impl NonceHmac for SyncHmac {
    fn hmac_sha256(&self, key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(key).expect("hmac accepts keys of any length");
        for part in parts {
            mac.update(part);
        }
        mac.finalize().into_bytes().into()
    }
}

/// Auxiliary randomness mixed into the derivation.
///
/// With `ExtraEntropy::None` the derivation is a pure function of
/// `(secret, message)`: signing twice yields byte-identical signatures.
/// Fixed or random extra entropy is appended to the seeding material,
/// which re-randomizes the nonce without weakening the deterministic
/// fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtraEntropy {
    /// Fully deterministic derivation.
    None,
    /// 32 caller-chosen bytes, e.g. for domain separation or test vectors.
    Fixed([u8; 32]),
}

impl ExtraEntropy {
    /// Fresh extra entropy from a cryptographically secure generator.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut aux = [0u8; 32];
        rng.fill_bytes(&mut aux);
        Self::Fixed(aux)
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            ExtraEntropy::None => &[],
            ExtraEntropy::Fixed(bytes) => bytes,
        }
    }
}

/// The RFC 6979 deterministic nonce generator.
///
/// # Example
/// ```
/// use secp256kit::nonce::{ExtraEntropy, Rfc6979};
/// use secp256kit::Scalar;
///
/// let nonce_gen = Rfc6979::new();
/// let secret = Scalar::random(&mut rand::thread_rng());
/// let msg_hash = [7u8; 32];
/// let k1 = nonce_gen.derive_nonce(&secret, &msg_hash, &ExtraEntropy::None, |_| true);
/// let k2 = nonce_gen.derive_nonce(&secret, &msg_hash, &ExtraEntropy::None, |_| true);
/// assert_eq!(k1, k2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Rfc6979<H = SyncHmac> {
    hmac: H,
}

impl Rfc6979<SyncHmac> {
    /// A generator backed by the default HMAC implementation.
    pub fn new() -> Self {
        Self { hmac: SyncHmac }
    }
}

impl<H> Rfc6979<H> {
    /// A generator backed by a caller-injected HMAC primitive.
    pub fn with_hmac(hmac: H) -> Self {
        Self { hmac }
    }
}

impl<H: NonceHmac> Rfc6979<H> {
    /// Derives a nonce for signing `msg_hash` under `secret`.
    ///
    /// Runs the RFC 6979 §3.2 state machine with HMAC-SHA-256. A candidate
    /// is accepted when it lies in `[1, n-1]` *and* `is_suitable` approves
    /// it; signature schemes use the callback to reject candidates that
    /// produce a zero `r` or `s`. Returns `None` only when [`MAX_TRIES`]
    /// candidates were rejected, which indicates a bug rather than bad
    /// luck.
    ///
    /// `msg_hash` may be any length; it enters the state via
    /// `bits2octets`, i.e. truncated to 256 bits and reduced modulo the
    /// curve order.
    pub fn derive_nonce(
        &self,
        secret: &Scalar,
        msg_hash: &[u8],
        extra: &ExtraEntropy,
        mut is_suitable: impl FnMut(&Scalar) -> bool,
    ) -> Option<Scalar> {
        let d = secret.to_bytes();
        let h = Scalar::from_bytes_reduced(msg_hash).to_bytes();
        let aux = extra.as_slice();

        let mut v = [0x01u8; 32];
        let mut k = [0x00u8; 32];

        k = self.hmac.hmac_sha256(&k, &[&v, &[0x00], &d, &h, aux]);
        v = self.hmac.hmac_sha256(&k, &[&v]);
        k = self.hmac.hmac_sha256(&k, &[&v, &[0x01], &d, &h, aux]);
        v = self.hmac.hmac_sha256(&k, &[&v]);

        for _ in 0..MAX_TRIES {
            v = self.hmac.hmac_sha256(&k, &[&v]);
            if let Some(candidate) = Scalar::from_bytes(v) {
                if !bool::from(candidate.is_zero()) && is_suitable(&candidate) {
                    return Some(candidate);
                }
            }
            k = self.hmac.hmac_sha256(&k, &[&v, &[0x00]]);
            v = self.hmac.hmac_sha256(&k, &[&v]);
        }
        None
    }
}
