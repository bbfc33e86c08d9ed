use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{KeyError, PostError};

/// A loaded private key, tagged by scheme.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Rsa(RsaPrivateKey),
}

impl KeyMaterial {
    /// Parses a bare PKCS#1 `RSAPrivateKey` structure.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self, KeyError> {
        RsaPrivateKey::from_pkcs1_der(der)
            .map(KeyMaterial::Rsa)
            .map_err(|e| KeyError::KeyParse(format!("PKCS#1: {e}")))
    }

    /// Parses an unencrypted PKCS#8 `PrivateKeyInfo` structure.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyError> {
        RsaPrivateKey::from_pkcs8_der(der)
            .map(KeyMaterial::Rsa)
            .map_err(|e| KeyError::KeyParse(format!("PKCS#8: {e}")))
    }

    pub fn from_pkcs8_encrypted_der(der: &[u8], password: &[u8]) -> Result<Self, KeyError> {
        RsaPrivateKey::from_pkcs8_encrypted_der(der, password)
            .map(KeyMaterial::Rsa)
            .map_err(|e| KeyError::KeyDecrypt(format!("PKCS#8: {e}")))
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyMaterial::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
        }
    }

    pub fn scheme(&self) -> &'static str {
        self.public_key().scheme()
    }

    pub fn bits(&self) -> usize {
        self.public_key().bits()
    }
}

/// Public half of a [`KeyMaterial`], as embedded in signed posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
}

impl PublicKey {
    /// Decodes a DER `SubjectPublicKeyInfo`.
    pub fn from_der(der: &[u8]) -> Result<Self, PostError> {
        RsaPublicKey::from_public_key_der(der)
            .map(PublicKey::Rsa)
            .map_err(|e| PostError::KeyParse(e.to_string()))
    }

    /// Encodes as a DER `SubjectPublicKeyInfo`.
    pub fn to_der(&self) -> Result<Vec<u8>, PostError> {
        match self {
            PublicKey::Rsa(key) => key
                .to_public_key_der()
                .map(|doc| doc.as_bytes().to_vec())
                .map_err(|e| PostError::KeySerialization(e.to_string())),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "rsa",
        }
    }

    pub fn bits(&self) -> usize {
        match self {
            PublicKey::Rsa(key) => key.size() * 8,
        }
    }
}
