//! Base64 helpers shared by the bundle types.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Standard-alphabet, padded base64.
pub fn encode_base64(bytes: impl AsRef<[u8]>) -> String {
    BASE64.encode(bytes)
}

/// Decodes standard-alphabet base64, naming `field` in the error.
pub fn decode_base64(field: &str, s: &str) -> CryptoResult<Vec<u8>> {
    decode_lenient(s)
        .map_err(|e| CryptoError::InvalidEncoding(format!("{field} is not valid base64: {e}")))
}

/// Single decode path for both the helpers and serde: surrounding
/// whitespace is ignored.
fn decode_lenient(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(s.trim())
}

/// `#[serde(with = "base64_serde")]` for any byte container.
pub(crate) mod base64_serde {
    use super::{BASE64, decode_lenient};
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(value.as_ref()))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: for<'a> TryFrom<&'a [u8]>,
        for<'a> <T as TryFrom<&'a [u8]>>::Error: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_lenient(&s).map_err(serde::de::Error::custom)?;
        T::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}
