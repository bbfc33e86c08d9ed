use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, KeyIvInit};
use md5::{Digest, Md5};
use pem::Pem;

use crate::error::KeyError;

/// One `-----BEGIN label----- ... -----END label-----` block.
#[derive(Debug, Clone)]
pub struct PemBlock(Pem);

/// Parses every block in `data`, skipping any text between blocks.
///
/// A block that fails to decode rejects the whole buffer.
pub fn parse_blocks(data: &[u8]) -> Result<Vec<PemBlock>, KeyError> {
    let blocks = pem::parse_many(data).map_err(|e| KeyError::KeyParse(format!("invalid PEM: {e}")))?;
    Ok(blocks.into_iter().map(PemBlock).collect())
}

impl PemBlock {
    pub fn label(&self) -> &str {
        self.0.tag()
    }

    pub fn contents(&self) -> &[u8] {
        self.0.contents()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.0.headers().get(name)
    }

    /// Whether the block uses OpenSSL's legacy `Proc-Type: 4,ENCRYPTED` scheme.
    pub fn is_encrypted(&self) -> bool {
        self.header("Proc-Type")
            .is_some_and(|v| v.split(',').any(|p| p.trim() == "ENCRYPTED"))
    }

    /// Decrypts a legacy encrypted block with the given password.
    pub fn decrypt(&self, password: &[u8]) -> Result<Vec<u8>, KeyError> {
        let dek_info = self
            .header("DEK-Info")
            .ok_or_else(|| KeyError::KeyDecrypt("missing DEK-Info header".into()))?;
        let (cipher, iv_hex) = dek_info
            .split_once(',')
            .ok_or_else(|| KeyError::KeyDecrypt(format!("malformed DEK-Info: {dek_info}")))?;
        let iv = hex::decode(iv_hex.trim())
            .map_err(|e| KeyError::KeyDecrypt(format!("invalid DEK-Info IV: {e}")))?;
        if iv.len() < 8 {
            return Err(KeyError::KeyDecrypt("DEK-Info IV too short".into()));
        }

        let data = self.contents().to_vec();
        match cipher.trim().to_ascii_uppercase().as_str() {
            "AES-128-CBC" => decrypt_cbc::<aes::Aes128>(password, &iv, 16, data),
            "AES-192-CBC" => decrypt_cbc::<aes::Aes192>(password, &iv, 24, data),
            "AES-256-CBC" => decrypt_cbc::<aes::Aes256>(password, &iv, 32, data),
            "DES-EDE3-CBC" => decrypt_cbc::<des::TdesEde3>(password, &iv, 24, data),
            "DES-CBC" => decrypt_cbc::<des::Des>(password, &iv, 8, data),
            other => Err(KeyError::KeyDecrypt(format!("unsupported cipher {other}"))),
        }
    }
}

fn decrypt_cbc<C>(password: &[u8], iv: &[u8], key_len: usize, mut data: Vec<u8>) -> Result<Vec<u8>, KeyError>
where
    C: BlockCipher + BlockDecryptMut,
    cbc::Decryptor<C>: KeyIvInit + BlockDecryptMut,
{
    let key = bytes_to_key(password, &iv[..8], key_len);
    let decryptor = cbc::Decryptor::<C>::new_from_slices(&key, iv)
        .map_err(|_| KeyError::KeyDecrypt("IV length does not match cipher".into()))?;
    let len = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut data)
        .map_err(|_| KeyError::KeyDecrypt("incorrect password".into()))?
        .len();
    data.truncate(len);
    Ok(data)
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration.
pub(crate) fn bytes_to_key(password: &[u8], salt: &[u8], key_len: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(key_len + 16);
    let mut prev: Vec<u8> = Vec::new();
    while key.len() < key_len {
        let mut hasher = Md5::new();
        hasher.update(&prev);
        hasher.update(password);
        hasher.update(salt);
        prev = hasher.finalize().to_vec();
        key.extend_from_slice(&prev);
    }
    key.truncate(key_len);
    key
}
