//! Binary payloads carried inside JSON as base64 strings.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Base64Bytes {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&BASE64_STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = BASE64_STANDARD
            .decode(s.trim())
            .map_err(serde::de::Error::custom)?;
        Ok(Base64Bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_as_standard_base64() {
        let json = serde_json::to_string(&Base64Bytes(b"hello".to_vec())).unwrap();
        assert_eq!(json, "\"aGVsbG8=\"");
    }

    #[test]
    fn test_decodes_and_rejects_garbage() {
        let bytes: Base64Bytes = serde_json::from_str("\"AAEC/w==\"").unwrap();
        assert_eq!(bytes.into_inner(), vec![0, 1, 2, 255]);

        assert!(serde_json::from_str::<Base64Bytes>("\"not base64!\"").is_err());
    }
}
