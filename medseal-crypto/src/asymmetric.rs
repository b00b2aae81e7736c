//! RSA-OAEP key wrapping.
//!
//! OAEP uses SHA-256 for both the label hash and MGF1. Keys are exchanged as
//! PEM text: SPKI/PKCS#8 by default, with PKCS#1 accepted on input because
//! that is what most existing key-pair sources emit for private keys.

use crate::error::{CryptoError, CryptoResult};
use crate::random::seeded_rng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

/// Modulus size used when the caller does not pick one.
pub const DEFAULT_MODULUS_BITS: usize = 2048;

/// Smallest modulus accepted for new key pairs.
pub const MIN_MODULUS_BITS: usize = 1024;

/// Output size of the OAEP hash (SHA-256).
const OAEP_HASH_SIZE: usize = 32;

/// Recipient public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Parses an SPKI (`BEGIN PUBLIC KEY`) or PKCS#1 (`BEGIN RSA PUBLIC KEY`) PEM.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let key = if pem.contains("BEGIN RSA PUBLIC KEY") {
            RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| CryptoError::InvalidKey(e.to_string()))?
        } else {
            RsaPublicKey::from_public_key_pem(pem)
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
        };
        Ok(Self(key))
    }

    /// Encodes as SPKI PEM with LF line endings.
    pub fn to_pem(&self) -> CryptoResult<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Modulus size in bytes; also the length of every wrapped key.
    pub fn modulus_bytes(&self) -> usize {
        self.0.size()
    }

    /// Largest payload OAEP-SHA256 can carry under this key.
    pub fn max_payload_len(&self) -> usize {
        self.modulus_bytes().saturating_sub(2 * OAEP_HASH_SIZE + 2)
    }

    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

/// Recipient private key. The underlying big integers are zeroized on drop.
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    /// Parses a PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`) PEM.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        // Parse errors are flattened so a malformed PEM never echoes key bytes.
        let key = if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|_| CryptoError::InvalidKey("malformed PKCS#1 private key".to_string()))?
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|_| CryptoError::InvalidKey("malformed PKCS#8 private key".to_string()))?
        };
        Ok(Self(key))
    }

    /// Encodes as PKCS#8 PEM. The returned string is wiped when dropped.
    pub fn to_pem(&self) -> CryptoResult<Zeroizing<String>> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Encodes as PKCS#1 PEM (`BEGIN RSA PRIVATE KEY`).
    pub fn to_pkcs1_pem(&self) -> CryptoResult<Zeroizing<String>> {
        self.0
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    pub fn modulus_bytes(&self) -> usize {
        self.0.size()
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self(key)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("modulus_bits", &(self.0.size() * 8))
            .finish_non_exhaustive()
    }
}

/// RSA key pair. Neither half is persisted by this crate.
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// Generates a key pair with [`DEFAULT_MODULUS_BITS`].
    pub fn generate() -> CryptoResult<Self> {
        generate_keypair(DEFAULT_MODULUS_BITS)
    }

    /// Rebuilds a key pair from a private key PEM.
    pub fn from_private_pem(pem: &str) -> CryptoResult<Self> {
        let private = PrivateKey::from_pem(pem)?;
        let public = private.public_key();
        Ok(Self { public, private })
    }
}

/// Generates a fresh RSA key pair with a `modulus_bits`-bit modulus.
pub fn generate_keypair(modulus_bits: usize) -> CryptoResult<KeyPair> {
    if modulus_bits < MIN_MODULUS_BITS {
        return Err(CryptoError::KeyGeneration(format!(
            "modulus of {modulus_bits} bits is below the {MIN_MODULUS_BITS}-bit minimum"
        )));
    }

    let mut rng = seeded_rng()?;
    let private = RsaPrivateKey::new(&mut rng, modulus_bits)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public = private.to_public_key();

    Ok(KeyPair {
        public: PublicKey(public),
        private: PrivateKey(private),
    })
}

/// Encrypts a small payload (a symmetric key) to `recipient`.
///
/// The size bound is checked here rather than left to the RSA backend so the
/// caller always gets `PayloadTooLarge` with the exact limit.
pub fn wrap_key(payload: &[u8], recipient: &PublicKey) -> CryptoResult<Vec<u8>> {
    let max = recipient.max_payload_len();
    if payload.len() > max {
        return Err(CryptoError::PayloadTooLarge {
            len: payload.len(),
            max,
        });
    }

    let mut rng = seeded_rng()?;
    recipient
        .0
        .encrypt(&mut rng, Oaep::new::<Sha256>(), payload)
        .map_err(|e| match e {
            rsa::Error::MessageTooLong => CryptoError::PayloadTooLarge {
                len: payload.len(),
                max,
            },
            other => CryptoError::InvalidKey(other.to_string()),
        })
}

/// Decrypts a wrapped payload with `private_key`.
///
/// Every decryption failure collapses into [`CryptoError::KeyRecoveryError`]
/// so callers cannot tell a padding failure from a length or key mismatch.
/// Only an unavailable random source (needed for blinding) is reported apart.
pub fn unwrap_key(ciphertext: &[u8], private_key: &PrivateKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let mut rng = seeded_rng()?;
    private_key
        .0
        .decrypt_blinded(&mut rng, Oaep::new::<Sha256>(), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::KeyRecoveryError)
}
