//! Elliptic-curve Diffie-Hellman key agreement.

use crate::{point::Point, scalar::Scalar};

/// Computes the shared secret `[d]Q` and returns its 33-byte compressed
/// encoding.
///
/// Returns `None` when the secret is zero (not a valid private key) or the
/// multiplication lands on the identity — with cofactor 1 that only
/// happens when `public` itself is the identity.
///
/// Both sides of an exchange derive the same bytes:
/// `[d_a]([d_b]G) = [d_a * d_b]G = [d_b]([d_a]G)`.
///
/// # Example
/// ```
/// use secp256kit::{ecdh, Point, Scalar};
/// let (a, b) = (
///     Scalar::random(&mut rand::thread_rng()),
///     Scalar::random(&mut rand::thread_rng()),
/// );
/// let (pk_a, pk_b) = (Point::BASE.mul(&a), Point::BASE.mul(&b));
/// assert_eq!(
///     ecdh::shared_secret(&a, &pk_b),
///     ecdh::shared_secret(&b, &pk_a),
/// );
/// ```
pub fn shared_secret(secret: &Scalar, public: &Point) -> Option<[u8; 33]> {
    if bool::from(secret.is_zero()) {
        return None;
    }
    public.mul(secret).to_bytes()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn symmetry() {
        let a = Scalar::random(&mut rand::thread_rng());
        let b = Scalar::random(&mut rand::thread_rng());
        let pk_a = Point::BASE.mul(&a);
        let pk_b = Point::BASE.mul(&b);
        let secret_ab = shared_secret(&a, &pk_b).unwrap();
        let secret_ba = shared_secret(&b, &pk_a).unwrap();
        assert_eq!(secret_ab, secret_ba);
        // Both equal the compressed encoding of [a*b]G.
        assert_eq!(
            secret_ab,
            Point::BASE.mul(&a.mul(&b)).to_bytes().unwrap()
        );
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let a = Scalar::random(&mut rand::thread_rng());
        assert!(shared_secret(&Scalar::ZERO, &Point::BASE).is_none());
        assert!(shared_secret(&a, &Point::IDENTITY).is_none());
    }
}
