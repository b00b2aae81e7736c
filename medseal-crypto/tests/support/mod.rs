//! Shared fixtures for medseal-crypto integration tests.
//!
//! RSA key generation dominates test time, so every test binary shares two
//! lazily generated 2048-bit key pairs.

#![allow(dead_code)]

use medseal_crypto::{EncryptedBundle, KeyPair};
use std::sync::LazyLock;

/// The intended recipient of every bundle in the tests.
pub static RECIPIENT: LazyLock<KeyPair> =
    LazyLock::new(|| KeyPair::generate().expect("recipient key generation"));

/// An unrelated key pair for wrong-key checks.
pub static STRANGER: LazyLock<KeyPair> =
    LazyLock::new(|| KeyPair::generate().expect("stranger key generation"));

/// Returns a copy of `bytes` with bit `bit` (counted from the start) flipped.
pub fn flip_bit(bytes: &[u8], bit: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out[bit / 8] ^= 1 << (bit % 8);
    out
}

/// Rebuilds `bundle` with a different ciphertext.
pub fn with_ciphertext(bundle: &EncryptedBundle, ciphertext: Vec<u8>) -> EncryptedBundle {
    EncryptedBundle::from_parts(
        ciphertext,
        bundle.wrapped_key().to_vec(),
        *bundle.nonce(),
        *bundle.tag(),
        *bundle.digest(),
    )
}

/// Rebuilds `bundle` with a different wrapped key.
pub fn with_wrapped_key(bundle: &EncryptedBundle, wrapped_key: Vec<u8>) -> EncryptedBundle {
    EncryptedBundle::from_parts(
        bundle.ciphertext().to_vec(),
        wrapped_key,
        *bundle.nonce(),
        *bundle.tag(),
        *bundle.digest(),
    )
}
