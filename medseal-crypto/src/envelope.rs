//! Envelope encryption for storage.
//!
//! Each payload gets a fresh AES-256-GCM key. The key is wrapped with the
//! recipient's RSA public key (OAEP-SHA256) and a SHA-256 digest of the
//! plaintext is carried alongside, so a record can later be checked against
//! what the uploader actually encrypted.
//!
//! Decryption authenticates the ciphertext through the GCM tag only. Digest
//! comparison is left to the caller via [`EncryptedBundle::verify_plaintext`]:
//! the tag answers "was this ciphertext altered", the digest answers "is this
//! the file that was uploaded".

use crate::asymmetric::{self, PrivateKey, PublicKey};
use crate::digest::{self, ContentDigest};
use crate::encoding::base64_serde;
use crate::error::{CryptoError, CryptoResult};
use crate::symmetric::{self, AuthenticationTag, Nonce, SymmetricKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A sealed payload ready for untrusted storage.
///
/// Carries no key material in the clear. Fields are read-only once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedBundle {
    #[serde(with = "base64_serde")]
    ciphertext: Vec<u8>,
    #[serde(with = "base64_serde")]
    wrapped_key: Vec<u8>,
    #[serde(with = "base64_serde")]
    nonce: Nonce,
    #[serde(rename = "authenticationTag", with = "base64_serde")]
    tag: AuthenticationTag,
    digest: ContentDigest,
}

impl EncryptedBundle {
    /// Reassembles a bundle from fields previously split out for storage.
    pub fn from_parts(
        ciphertext: Vec<u8>,
        wrapped_key: Vec<u8>,
        nonce: Nonce,
        tag: AuthenticationTag,
        digest: ContentDigest,
    ) -> Self {
        Self {
            ciphertext,
            wrapped_key,
            nonce,
            tag,
            digest,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn wrapped_key(&self) -> &[u8] {
        &self.wrapped_key
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn tag(&self) -> &AuthenticationTag {
        &self.tag
    }

    /// SHA-256 of the original plaintext.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Consumes the bundle, handing back the ciphertext without copying.
    pub fn into_ciphertext(self) -> Vec<u8> {
        self.ciphertext
    }

    /// Compares `plaintext` against the digest recorded at encryption time.
    pub fn verify_plaintext(&self, plaintext: &[u8]) -> CryptoResult<()> {
        self.digest.verify(plaintext)
    }
}

/// Seals `plaintext` so only the holder of `recipient`'s private key can open it.
pub fn encrypt_for_storage(plaintext: &[u8], recipient: &PublicKey) -> CryptoResult<EncryptedBundle> {
    let key = symmetric::generate_key()?;
    let sealed = symmetric::encrypt(plaintext, &key)?;
    let wrapped_key = asymmetric::wrap_key(key.as_bytes(), recipient)?;
    drop(key);

    let digest = digest::digest(plaintext);

    debug!(
        plaintext_len = plaintext.len(),
        wrapped_key_len = wrapped_key.len(),
        "sealed payload for storage"
    );

    Ok(EncryptedBundle {
        ciphertext: sealed.ciphertext,
        wrapped_key,
        nonce: sealed.nonce,
        tag: sealed.tag,
        digest,
    })
}

/// Opens a bundle with the recipient's private key.
///
/// Does not check [`EncryptedBundle::digest`]; see the module docs.
pub fn decrypt_from_storage(bundle: &EncryptedBundle, recipient: &PrivateKey) -> CryptoResult<Vec<u8>> {
    let key = recover_key(&bundle.wrapped_key, recipient).inspect_err(|_| {
        warn!("wrapped key could not be recovered");
    })?;

    let plaintext = symmetric::decrypt(&bundle.ciphertext, &key, &bundle.nonce, &bundle.tag)
        .inspect_err(|_| {
            warn!(
                ciphertext_len = bundle.ciphertext.len(),
                "bundle failed authentication"
            );
        })?;

    debug!(plaintext_len = plaintext.len(), "opened bundle from storage");
    Ok(plaintext)
}

fn recover_key(wrapped_key: &[u8], recipient: &PrivateKey) -> CryptoResult<SymmetricKey> {
    let bytes = asymmetric::unwrap_key(wrapped_key, recipient)?;
    // A well-formed OAEP block carrying the wrong length is still a failed unwrap.
    SymmetricKey::from_slice(&bytes).map_err(|_| CryptoError::KeyRecoveryError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asymmetric::KeyPair;
    use std::sync::LazyLock;

    static PAIR: LazyLock<KeyPair> = LazyLock::new(|| KeyPair::generate().unwrap());

    #[test]
    fn round_trip() {
        let bundle = encrypt_for_storage(b"discharge summary", &PAIR.public).unwrap();
        let plaintext = decrypt_from_storage(&bundle, &PAIR.private).unwrap();
        assert_eq!(plaintext, b"discharge summary");
    }

    #[test]
    fn digest_covers_plaintext_not_ciphertext() {
        let bundle = encrypt_for_storage(b"discharge summary", &PAIR.public).unwrap();
        assert_eq!(*bundle.digest(), digest::digest(b"discharge summary"));
        assert_ne!(*bundle.digest(), digest::digest(bundle.ciphertext()));
    }

    #[test]
    fn wrapped_non_key_payload_is_key_recovery_error() {
        let sealed = encrypt_for_storage(b"payload", &PAIR.public).unwrap();
        // 16 bytes wraps fine but is not a valid AES-256 key.
        let wrapped = asymmetric::wrap_key(&[9u8; 16], &PAIR.public).unwrap();
        let bundle = EncryptedBundle::from_parts(
            sealed.ciphertext().to_vec(),
            wrapped,
            *sealed.nonce(),
            *sealed.tag(),
            *sealed.digest(),
        );
        let err = decrypt_from_storage(&bundle, &PAIR.private).unwrap_err();
        assert!(matches!(err, CryptoError::KeyRecoveryError));
    }

    #[test]
    fn verify_plaintext_flags_other_content() {
        let bundle = encrypt_for_storage(b"original scan", &PAIR.public).unwrap();
        assert!(bundle.verify_plaintext(b"original scan").is_ok());
        assert!(matches!(
            bundle.verify_plaintext(b"another scan"),
            Err(CryptoError::IntegrityMismatch { .. })
        ));
    }
}
