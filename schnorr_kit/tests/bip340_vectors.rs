//! BIP-340 conformance: the reference test vector and derived checks.

use hex_literal::hex;
use schnorr_kit::{sign, verify, KeyPair, Signature};
use secp256kit::{Scalar, XOnly};

/// Test vector 0 from the BIP-340 reference data: secret key 3, zero
/// message, zero auxiliary randomness.
#[test]
fn vector_zero_signs_byte_exactly() {
    let secret = Scalar::from_bytes(hex!(
        "0000000000000000000000000000000000000000000000000000000000000003"
    ))
    .unwrap();
    let keypair = KeyPair::new(secret).unwrap();
    assert_eq!(
        keypair.public_key().as_bytes(),
        &hex!("F9308A019258C31049344F85F89D5229B531C845836F99B08601F113BCE036F9")
    );

    let msg = [0u8; 32];
    let aux = [0u8; 32];
    let signature = sign(&keypair, &msg, &aux).unwrap();
    assert_eq!(
        signature.to_bytes(),
        hex!(
            "E907831F80848D1069A5371B402410364BDF1C5F8307B0084C55F1CE2DCA8215"
            "25F66A4A85EA8B71E482A74F382D2CE5EBEEE8FDB2172F477DF4900D310536C0"
        )
    );
    assert!(verify(&signature, &msg, keypair.public_key()));
}

#[test]
fn vector_zero_verifies_from_raw_bytes() {
    let public_key = XOnly::from_bytes(hex!(
        "F9308A019258C31049344F85F89D5229B531C845836F99B08601F113BCE036F9"
    ))
    .unwrap();
    let signature = Signature::from_bytes(hex!(
        "E907831F80848D1069A5371B402410364BDF1C5F8307B0084C55F1CE2DCA8215"
        "25F66A4A85EA8B71E482A74F382D2CE5EBEEE8FDB2172F477DF4900D310536C0"
    ))
    .unwrap();
    let msg = [0u8; 32];
    assert!(verify(&signature, &msg, &public_key));

    // Any single-byte flip in the signature must fail.
    for position in [0usize, 17, 31, 32, 45, 63] {
        let mut bytes = signature.to_bytes();
        bytes[position] ^= 0x20;
        if let Some(tampered) = Signature::from_bytes(bytes) {
            assert!(
                !verify(&tampered, &msg, &public_key),
                "flip at byte {position} still verified"
            );
        }
    }

    // Wrong message and wrong key fail too.
    assert!(!verify(&signature, &[1u8; 32], &public_key));
    let other = KeyPair::new(Scalar::from(5u32)).unwrap();
    assert!(!verify(&signature, &msg, other.public_key()));
}

#[test]
fn signature_hex_round_trip() {
    let text = "e907831f80848d1069a5371b402410364bdf1c5f8307b0084c55f1ce2dca821525f66a4a85ea8b71e482a74f382d2ce5ebeee8fdb2172f477df4900d310536c0";
    let signature: Signature = text.parse().unwrap();
    assert_eq!(signature.to_string(), text);
}
