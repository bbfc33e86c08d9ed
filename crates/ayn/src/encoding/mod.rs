mod canonical;

use sha2::{Digest, Sha512};

pub use canonical::{encode, encode_to};

/// The result of encoding a document for signing.
pub struct EncodedDocument {
    /// Canonical JSON bytes.
    pub data: Vec<u8>,
    /// SHA-512 of `data`, the input to the signature primitive.
    pub digest: Vec<u8>,
}

/// Canonically encodes `document` and hashes the result.
///
/// Used for both signing and verification.
pub fn encode_for_signing(document: &serde_json::Value) -> EncodedDocument {
    let data = encode(document);
    let digest = Sha512::digest(&data).to_vec();
    EncodedDocument { data, digest }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_matches_sha512() {
        let encoded = encode_for_signing(&json!({"key": "value"}));
        assert_eq!(encoded.data, br#"{"key":"value"}"#);
        assert_eq!(encoded.digest, Sha512::digest(&encoded.data).to_vec());
        assert_eq!(encoded.digest.len(), 64);
    }

    #[test]
    fn deterministic_encoding() {
        let enc1 = encode_for_signing(&json!({"b": 2, "a": 1}));
        let enc2 = encode_for_signing(&json!({"a": 1, "b": 2}));
        assert_eq!(enc1.data, enc2.data);
        assert_eq!(enc1.digest, enc2.digest);
    }
}
