use crate::error::PostError;
use crate::key::{KeyMaterial, PublicKey};

/// Signs digests of canonical posts.
///
/// Implementations are sync, signing is CPU-bound.
pub trait PostSigner: Send + Sync {
    /// Sign a SHA-512 digest. Returns raw signature bytes.
    fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, PostError>;

    /// Public key embedded into every post this signer produces.
    fn public_key(&self) -> PublicKey;
}

/// Checks signatures over digests of canonical posts.
pub trait PostVerifier {
    fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> Result<(), PostError>;
}

impl PostSigner for KeyMaterial {
    fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, PostError> {
        match self {
            KeyMaterial::Rsa(key) => super::rsa::sign_digest(key, digest),
        }
    }

    fn public_key(&self) -> PublicKey {
        KeyMaterial::public_key(self)
    }
}

impl PostVerifier for PublicKey {
    fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> Result<(), PostError> {
        match self {
            PublicKey::Rsa(key) => super::rsa::verify_digest(key, digest, signature),
        }
    }
}
