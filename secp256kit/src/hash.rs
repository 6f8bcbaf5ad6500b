//! Hashing utilities: BIP-340 tagged hashes and digest plumbing.
//!
//! Everything is defined against the [`Digest`] trait from the RustCrypto
//! project, instantiated with SHA-256 — the only hash this curve stack
//! uses.
//!
//! [`Digest`]: digest::Digest

use digest::Digest;
use sha2::Sha256;

/// Returns a SHA-256 instance pre-fed with `SHA256(tag) || SHA256(tag)`,
/// the domain-separated hash introduced in [BIP-340].
///
/// # Example
/// ```
/// use digest::Digest;
/// use secp256kit::hash::tagged_hash;
/// let digest = tagged_hash(b"my-domain/my-purpose").chain_update(b"hello world").finalize();
/// ```
///
/// [BIP-340]: https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki
pub fn tagged_hash(tag: &[u8]) -> Sha256 {
    let hashed_tag = Sha256::digest(tag);
    let mut tagged = Sha256::new();
    tagged.update(hashed_tag);
    tagged.update(hashed_tag);
    tagged
}

/// Anything that can feed itself into a hash.
///
/// Implementations decide how the type is converted to bytes before it is
/// absorbed.
pub trait HashInto {
    /// Converts `self` to bytes and adds them to `hash`.
    fn hash_into(&self, hash: &mut impl Digest);
}

impl HashInto for [u8] {
    fn hash_into(&self, hash: &mut impl Digest) {
        hash.update(self)
    }
}

impl<const N: usize> HashInto for [u8; N] {
    fn hash_into(&self, hash: &mut impl Digest) {
        hash.update(self)
    }
}

/// Extension trait making it convenient to chain [`HashInto`] values onto a
/// digest.
pub trait HashAdd {
    /// Absorbs `data` and returns the updated digest.
    fn add<HI: HashInto + ?Sized>(self, data: &HI) -> Self;
}

impl<D: Digest> HashAdd for D {
    fn add<HI: HashInto + ?Sized>(mut self, data: &HI) -> Self {
        data.hash_into(&mut self);
        self
    }
}

/// Finalizes a SHA-256 state into a fixed 32-byte array.
pub fn finalize(hash: Sha256) -> [u8; 32] {
    hash.finalize().into()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hash::HashAdd;

    #[test]
    fn tagged_hash_differs_from_plain() {
        let plain = finalize(Sha256::new().add(b"msg".as_slice()));
        let tagged = finalize(tagged_hash(b"BIP0340/challenge").add(b"msg".as_slice()));
        assert_ne!(plain, tagged);
    }

    #[test]
    fn tags_separate_domains() {
        let aux = finalize(tagged_hash(b"BIP0340/aux").add(&[0u8; 32]));
        let nonce = finalize(tagged_hash(b"BIP0340/nonce").add(&[0u8; 32]));
        assert_ne!(aux, nonce);
    }
}
