//! AES-256-GCM authenticated encryption with detached tags.
//!
//! Ciphertext is always the same length as the plaintext; the nonce and the
//! 16-byte tag travel beside it instead of being appended.

use crate::error::{CryptoError, CryptoResult};
use crate::random::fill_random;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of a GCM nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// One-time AES-256 key. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Builds a key from raw bytes, e.g. after unwrapping.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "symmetric key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// 96-bit GCM nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; NONCE_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidEncoding(format!(
                "nonce must be {NONCE_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl From<[u8; NONCE_SIZE]> for Nonce {
    fn from(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Nonce {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Nonce {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> CryptoResult<Self> {
        Self::from_slice(bytes)
    }
}

/// 128-bit GCM authentication tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AuthenticationTag([u8; TAG_SIZE]);

impl AuthenticationTag {
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; TAG_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidEncoding(format!(
                "authentication tag must be {TAG_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }
}

impl From<[u8; TAG_SIZE]> for AuthenticationTag {
    fn from(bytes: [u8; TAG_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AuthenticationTag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for AuthenticationTag {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> CryptoResult<Self> {
        Self::from_slice(bytes)
    }
}

/// Output of a symmetric encryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedPayload {
    pub ciphertext: Vec<u8>,
    pub nonce: Nonce,
    pub tag: AuthenticationTag,
}

/// Generates a fresh random 256-bit key.
pub fn generate_key() -> CryptoResult<SymmetricKey> {
    let mut bytes = [0u8; KEY_SIZE];
    fill_random(&mut bytes)?;
    let key = SymmetricKey(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Generates a fresh random nonce.
pub fn generate_nonce() -> CryptoResult<Nonce> {
    let mut bytes = [0u8; NONCE_SIZE];
    fill_random(&mut bytes)?;
    Ok(Nonce(bytes))
}

/// Encrypts `plaintext` under `key` with a freshly drawn nonce.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<SealedPayload> {
    encrypt_with_aad(plaintext, b"", key)
}

/// Encrypts `plaintext`, binding the tag to `aad` as well.
pub fn encrypt_with_aad(
    plaintext: &[u8],
    aad: &[u8],
    key: &SymmetricKey,
) -> CryptoResult<SealedPayload> {
    let nonce = generate_nonce()?;
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce.as_bytes()), aad, &mut buffer)
        .map_err(|_| {
            buffer.zeroize();
            CryptoError::InvalidEncoding("payload exceeds AES-GCM length limit".to_string())
        })?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(&tag);

    Ok(SealedPayload {
        ciphertext: buffer,
        nonce,
        tag: AuthenticationTag(tag_bytes),
    })
}

/// Verifies `tag` and decrypts `ciphertext`.
pub fn decrypt(
    ciphertext: &[u8],
    key: &SymmetricKey,
    nonce: &Nonce,
    tag: &AuthenticationTag,
) -> CryptoResult<Vec<u8>> {
    decrypt_with_aad(ciphertext, b"", key, nonce, tag)
}

/// Verifies `tag` over `ciphertext` and `aad`, then decrypts.
///
/// On mismatch the working buffer is wiped before the error is returned, so
/// no plaintext (partial or whole) leaves this function.
pub fn decrypt_with_aad(
    ciphertext: &[u8],
    aad: &[u8],
    key: &SymmetricKey,
    nonce: &Nonce,
    tag: &AuthenticationTag,
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

    let mut buffer = ciphertext.to_vec();
    match cipher.decrypt_in_place_detached(
        GenericArray::from_slice(nonce.as_bytes()),
        aad,
        &mut buffer,
        GenericArray::from_slice(tag.as_bytes()),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(CryptoError::AuthenticationFailure)
        }
    }
}
