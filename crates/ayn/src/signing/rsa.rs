use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha512;

use crate::error::PostError;

/// RSASSA-PKCS1-v1_5 over a SHA-512 digest.
///
/// The padding is deterministic, so the same key and digest always produce
/// the same signature.
pub(crate) fn sign_digest(key: &RsaPrivateKey, digest: &[u8]) -> Result<Vec<u8>, PostError> {
    key.sign(Pkcs1v15Sign::new::<Sha512>(), digest)
        .map_err(|e| PostError::Signing(format!("rsa-pkcs1v15-sha512: {e}")))
}

pub(crate) fn verify_digest(key: &RsaPublicKey, digest: &[u8], signature: &[u8]) -> Result<(), PostError> {
    key.verify(Pkcs1v15Sign::new::<Sha512>(), digest, signature)
        .map_err(|_| PostError::SignatureMismatch)
}
