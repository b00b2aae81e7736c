//! SHA-256 content fingerprints.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;

/// Size of a content digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Read block size used by [`digest_reader`].
const READ_BLOCK_SIZE: usize = 4096;

/// SHA-256 fingerprint of a plaintext payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; DIGEST_SIZE]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character hex string (either case).
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| CryptoError::InvalidEncoding(format!("digest is not hex: {e}")))?;
        let arr: [u8; DIGEST_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidEncoding(format!(
                "digest must be {DIGEST_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Recomputes the digest of `data` and compares it with `self`.
    pub fn verify(&self, data: &[u8]) -> CryptoResult<()> {
        let actual = digest(data);
        if actual == *self {
            Ok(())
        } else {
            tracing::warn!(expected = %self, actual = %actual, "content digest mismatch");
            Err(CryptoError::IntegrityMismatch {
                expected: self.to_hex(),
                actual: actual.to_hex(),
            })
        }
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentDigest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Computes the SHA-256 digest of `data`.
pub fn digest(data: &[u8]) -> ContentDigest {
    ContentDigest(Sha256::digest(data).into())
}

/// Computes the SHA-256 digest of everything `reader` yields.
///
/// Reads in 4 KiB blocks so large files never need to be held in memory.
pub fn digest_reader<R: Read>(mut reader: R) -> CryptoResult<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut block = [0u8; READ_BLOCK_SIZE];
    loop {
        let n = match reader.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&block[..n]);
    }
    Ok(ContentDigest(hasher.finalize().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_hello_world() {
        assert_eq!(
            digest(b"hello world").to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn known_vector_empty() {
        assert_eq!(
            digest(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn reader_matches_one_shot() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = digest_reader(std::io::Cursor::new(&data)).unwrap();
        assert_eq!(streamed, digest(&data));
    }

    #[test]
    fn hex_round_trip_and_uppercase() {
        let d = digest(b"x-ray");
        assert_eq!(ContentDigest::from_hex(&d.to_hex()).unwrap(), d);
        assert_eq!(ContentDigest::from_hex(&d.to_hex().to_uppercase()).unwrap(), d);
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(
            ContentDigest::from_hex("zz"),
            Err(CryptoError::InvalidEncoding(_))
        ));
        assert!(matches!(
            ContentDigest::from_hex("abcd"),
            Err(CryptoError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn verify_detects_mismatch() {
        let d = digest(b"original");
        assert!(d.verify(b"original").is_ok());
        match d.verify(b"modified") {
            Err(CryptoError::IntegrityMismatch { expected, actual }) => {
                assert_eq!(expected, d.to_hex());
                assert_eq!(actual, digest(b"modified").to_hex());
            }
            other => panic!("expected IntegrityMismatch, got {other:?}"),
        }
    }

    #[test]
    fn serializes_as_hex_string() {
        let d = digest(b"hello world");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
