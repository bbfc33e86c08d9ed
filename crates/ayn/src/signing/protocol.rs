use serde_json::Value;
use tracing::debug;

use super::post::{EmbeddedKey, Post, Signature};
use super::signer::{PostSigner, PostVerifier};
use crate::encoding::{encode, encode_for_signing};
use crate::error::PostError;
use crate::key::PublicKey;

/// A freshly signed post together with its canonical wire bytes.
#[derive(Debug, Clone)]
pub struct SignedPost {
    pub post: Post,
    pub data: Vec<u8>,
}

impl SignedPost {
    /// Raw signature bytes, also the storage key of the post.
    pub fn signature(&self) -> &[u8] {
        self.post.sig.as_ref().map(|s| s.hash.as_slice()).unwrap_or_default()
    }
}

/// Extracts `content` from a sign request body.
///
/// The body must be a JSON object with a `content` member; any `key` or `sig`
/// members it carries are ignored.
pub fn parse_sign_request(body: &[u8]) -> Result<Value, PostError> {
    let request: Value =
        serde_json::from_slice(body).map_err(|e| PostError::MalformedDocument(e.to_string()))?;
    let Value::Object(mut members) = request else {
        return Err(PostError::MalformedDocument("request body must be a JSON object".into()));
    };
    members
        .remove("content")
        .ok_or_else(|| PostError::MalformedDocument("missing content".into()))
}

/// Signs `content` with `signer`.
///
/// 1. Embeds the signer's DER public key.
/// 2. Hashes the canonical encoding of `{content, key}` with SHA-512.
/// 3. Signs the digest and attaches it as `sig`.
/// 4. Returns the canonical encoding of the complete post.
pub fn sign_post(content: Value, signer: &dyn PostSigner) -> Result<SignedPost, PostError> {
    let crt = signer.public_key().to_der()?;
    let mut post = Post {
        content,
        key: EmbeddedKey { crt },
        sig: None,
    };

    let encoded = encode_for_signing(&post.to_value()?);
    let hash = signer.sign_digest(&encoded.digest)?;
    post.sig = Some(Signature { hash });

    let data = encode(&post.to_value()?);
    debug!(bytes = data.len(), "signed post");
    Ok(SignedPost { post, data })
}

/// Checks that a signed post's signature matches its embedded public key
/// and its content. Returns the parsed post.
pub fn verify_post(data: &[u8]) -> Result<Post, PostError> {
    let mut post: Post =
        serde_json::from_slice(data).map_err(|e| PostError::MalformedDocument(e.to_string()))?;
    let sig = post
        .sig
        .take()
        .ok_or_else(|| PostError::MalformedDocument("missing signature".into()))?;

    let public_key = PublicKey::from_der(&post.key.crt)?;
    let encoded = encode_for_signing(&post.to_value()?);
    public_key.verify_digest(&encoded.digest, &sig.hash)?;

    post.sig = Some(sig);
    Ok(post)
}
