use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PostError;

/// A signed (or about to be signed) document.
///
/// Wire form: `{"content": ..., "key": {"crt": "<b64>"}, "sig": {"hash": "<b64>"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub content: Value,
    pub key: EmbeddedKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<Signature>,
}

/// DER `SubjectPublicKeyInfo` of the signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedKey {
    #[serde(with = "base64_bytes")]
    pub crt: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "base64_bytes")]
    pub hash: Vec<u8>,
}

impl Post {
    pub fn to_value(&self) -> Result<Value, PostError> {
        serde_json::to_value(self).map_err(|e| PostError::MalformedDocument(e.to_string()))
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unsigned_post_omits_sig() {
        let post = Post {
            content: json!({"msg": "hello"}),
            key: EmbeddedKey { crt: vec![1, 2, 3] },
            sig: None,
        };
        assert_eq!(
            post.to_value().unwrap(),
            json!({"content": {"msg": "hello"}, "key": {"crt": "AQID"}})
        );
    }

    #[test]
    fn parses_wire_form() {
        let post: Post = serde_json::from_value(json!({
            "content": [1, "two"],
            "key": {"crt": "AQID"},
            "sig": {"hash": "/w=="},
        }))
        .unwrap();
        assert_eq!(post.key.crt, vec![1, 2, 3]);
        assert_eq!(post.sig.unwrap().hash, vec![0xff]);
    }

    #[test]
    fn rejects_invalid_base64() {
        let result: Result<Post, _> = serde_json::from_value(json!({
            "content": null,
            "key": {"crt": "not base64!"},
        }));
        assert!(result.is_err());
    }
}
