//! Text encodings used at the collaborator boundary.
//!
//! Storage and ledger layers exchange keys as PEM and the small binary
//! fields as base64 (digest as hex). The ciphertext stays raw bytes since
//! it goes straight to the blob store.

use crate::asymmetric::{PrivateKey, PublicKey};
use crate::digest::ContentDigest;
use crate::encoding::{decode_base64, encode_base64};
use crate::envelope::{self, EncryptedBundle};
use crate::error::CryptoResult;
use crate::symmetric::{AuthenticationTag, Nonce};
use serde::{Deserialize, Serialize};

/// [`EncryptedBundle`] with its non-ciphertext fields in transport encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedBundle {
    #[serde(skip)]
    pub ciphertext: Vec<u8>,
    /// Base64 of the RSA-OAEP wrapped key.
    pub wrapped_key: String,
    /// Base64 of the 12-byte nonce.
    pub nonce: String,
    /// Base64 of the 16-byte GCM tag.
    pub authentication_tag: String,
    /// Lowercase hex SHA-256 of the plaintext.
    pub digest: String,
}

impl From<&EncryptedBundle> for EncodedBundle {
    fn from(bundle: &EncryptedBundle) -> Self {
        Self {
            ciphertext: bundle.ciphertext().to_vec(),
            wrapped_key: encode_base64(bundle.wrapped_key()),
            nonce: encode_base64(bundle.nonce()),
            authentication_tag: encode_base64(bundle.tag()),
            digest: bundle.digest().to_hex(),
        }
    }
}

impl From<EncryptedBundle> for EncodedBundle {
    fn from(bundle: EncryptedBundle) -> Self {
        let wrapped_key = encode_base64(bundle.wrapped_key());
        let nonce = encode_base64(bundle.nonce());
        let authentication_tag = encode_base64(bundle.tag());
        let digest = bundle.digest().to_hex();
        Self {
            ciphertext: bundle.into_ciphertext(),
            wrapped_key,
            nonce,
            authentication_tag,
            digest,
        }
    }
}

impl TryFrom<&EncodedBundle> for EncryptedBundle {
    type Error = crate::error::CryptoError;

    fn try_from(encoded: &EncodedBundle) -> CryptoResult<Self> {
        Ok(EncryptedBundle::from_parts(
            encoded.ciphertext.clone(),
            decode_base64("wrappedKey", &encoded.wrapped_key)?,
            decode_nonce(&encoded.nonce)?,
            decode_tag(&encoded.authentication_tag)?,
            ContentDigest::from_hex(&encoded.digest)?,
        ))
    }
}

/// Decodes a base64 nonce, checking its length.
pub fn decode_nonce(nonce_b64: &str) -> CryptoResult<Nonce> {
    Nonce::from_slice(&decode_base64("nonce", nonce_b64)?)
}

/// Decodes a base64 authentication tag, checking its length.
pub fn decode_tag(tag_b64: &str) -> CryptoResult<AuthenticationTag> {
    AuthenticationTag::from_slice(&decode_base64("authenticationTag", tag_b64)?)
}

/// PEM-in, encoded-out form of [`envelope::encrypt_for_storage`].
pub fn encrypt_for_storage_pem(plaintext: &[u8], recipient_public_pem: &str) -> CryptoResult<EncodedBundle> {
    let recipient = PublicKey::from_pem(recipient_public_pem)?;
    let bundle = envelope::encrypt_for_storage(plaintext, &recipient)?;
    Ok(EncodedBundle::from(bundle))
}

/// Encoded-in form of [`envelope::decrypt_from_storage`].
///
/// The digest is not part of the inputs: opening never depends on it.
pub fn decrypt_from_storage_pem(
    ciphertext: &[u8],
    wrapped_key_b64: &str,
    nonce_b64: &str,
    tag_b64: &str,
    recipient_private_pem: &str,
) -> CryptoResult<Vec<u8>> {
    let recipient = PrivateKey::from_pem(recipient_private_pem)?;
    let wrapped_key = decode_base64("wrappedKey", wrapped_key_b64)?;
    let nonce = decode_nonce(nonce_b64)?;
    let tag = decode_tag(tag_b64)?;

    // Digest is irrelevant to opening; a zero placeholder keeps the bundle whole.
    let bundle = EncryptedBundle::from_parts(
        ciphertext.to_vec(),
        wrapped_key,
        nonce,
        tag,
        ContentDigest::from_bytes([0u8; crate::digest::DIGEST_SIZE]),
    );
    envelope::decrypt_from_storage(&bundle, &recipient)
}
