//! Envelope encryption core for medseal.
//!
//! Protects opaque payloads (medical record files) before they reach
//! untrusted storage, using:
//! - AES-256-GCM for authenticated encryption of the payload
//! - RSA-OAEP (SHA-256) for wrapping the one-time payload key
//! - SHA-256 for an independent content fingerprint
//!
//! # Architecture
//!
//! Every call to [`encrypt_for_storage`] generates a fresh 256-bit key and
//! 96-bit nonce, encrypts the payload, wraps the key to the recipient's
//! public key and fingerprints the plaintext. The resulting
//! [`EncryptedBundle`] holds no key material in the clear.
//!
//! [`decrypt_from_storage`] unwraps the key and verifies the GCM tag before
//! releasing any plaintext. It does not compare digests; callers that need
//! end-to-end content verification call [`EncryptedBundle::verify_plaintext`].
//!
//! All operations are stateless and safe to run concurrently. The only
//! shared resource is the OS random source.

pub mod asymmetric;
pub mod digest;
mod encoding;
pub mod envelope;
mod error;
mod random;
pub mod symmetric;
pub mod transport;

pub use asymmetric::{
    generate_keypair, unwrap_key, wrap_key, KeyPair, PrivateKey, PublicKey, DEFAULT_MODULUS_BITS,
    MIN_MODULUS_BITS,
};
pub use digest::{digest, digest_reader, ContentDigest, DIGEST_SIZE};
pub use encoding::{decode_base64, encode_base64};
pub use envelope::{decrypt_from_storage, encrypt_for_storage, EncryptedBundle};
pub use error::{CryptoError, CryptoResult};
pub use symmetric::{
    generate_key, AuthenticationTag, Nonce, SealedPayload, SymmetricKey, KEY_SIZE, NONCE_SIZE,
    TAG_SIZE,
};
pub use transport::{decrypt_from_storage_pem, encrypt_for_storage_pem, EncodedBundle};
