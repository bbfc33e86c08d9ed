use std::io::Read;

use tracing::{debug, warn};

use super::format::KeyFileFormat;
use super::material::KeyMaterial;
use super::pem::{PemBlock, parse_blocks};
use crate::error::KeyError;

/// Supplies the password for an encrypted key, given an alias.
///
/// May be called any number of times, in any order.
pub trait PasswordProvider {
    fn password(&self, alias: &str) -> String;
}

impl<F> PasswordProvider for F
where
    F: Fn(&str) -> String,
{
    fn password(&self, alias: &str) -> String {
        self(alias)
    }
}

/// Private keys read out of one key file, in file order.
///
/// Single pass: every item is either a fully parsed key or the error for the
/// entry that failed.
pub struct Keys<P> {
    source: Source,
    password: P,
}

enum Source {
    Pem(std::vec::IntoIter<PemBlock>),
    Der(Option<Vec<u8>>),
}

/// Reads `reader` to the end and prepares to parse it as `format`.
pub fn extract<R, P>(format: KeyFileFormat, mut reader: R, password: P) -> Result<Keys<P>, KeyError>
where
    R: Read,
    P: PasswordProvider,
{
    let source = match format {
        KeyFileFormat::Pem | KeyFileFormat::Der => {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            if format == KeyFileFormat::Pem {
                Source::Pem(parse_blocks(&data)?.into_iter())
            } else {
                Source::Der(Some(data))
            }
        }
        KeyFileFormat::Pkcs12 | KeyFileFormat::Jceks => {
            return Err(KeyError::UnsupportedFormat(format));
        }
        KeyFileFormat::Unknown => return Err(KeyError::UnrecognizedFormat),
    };
    Ok(Keys { source, password })
}

/// Visitor form of [`extract`]: calls `on_key_found` per key and stops at the
/// first failing entry. Returns how many keys were reported.
pub fn extract_with<R, P, F>(
    format: KeyFileFormat,
    reader: R,
    password: P,
    mut on_key_found: F,
) -> Result<usize, KeyError>
where
    R: Read,
    P: PasswordProvider,
    F: FnMut(KeyMaterial),
{
    let mut found = 0;
    for key in extract(format, reader, password)? {
        on_key_found(key?);
        found += 1;
    }
    Ok(found)
}

impl<P: PasswordProvider> Iterator for Keys<P> {
    type Item = Result<KeyMaterial, KeyError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Pem(blocks) => blocks.find_map(|block| key_from_block(&block, &self.password)),
            Source::Der(data) => data.take().map(|der| {
                KeyMaterial::from_pkcs1_der(&der).or_else(|_| KeyMaterial::from_pkcs8_der(&der))
            }),
        }
    }
}

/// Parses one PEM block, or returns `None` for blocks that hold no private key.
fn key_from_block<P: PasswordProvider>(block: &PemBlock, password: &P) -> Option<Result<KeyMaterial, KeyError>> {
    let label = block.label();
    let key = match label {
        "RSA PRIVATE KEY" if block.is_encrypted() => {
            debug!(label, "decrypting legacy encrypted PEM block");
            let pass = password.password(label);
            block.decrypt(pass.as_bytes()).and_then(|der| {
                // A wrong password can still unpad cleanly; the garbage then fails to parse.
                KeyMaterial::from_pkcs1_der(&der)
                    .map_err(|_| KeyError::KeyDecrypt("incorrect password".into()))
            })
        }
        "RSA PRIVATE KEY" => KeyMaterial::from_pkcs1_der(block.contents()),
        "PRIVATE KEY" => KeyMaterial::from_pkcs8_der(block.contents()),
        "ENCRYPTED PRIVATE KEY" => {
            let pass = password.password(label);
            KeyMaterial::from_pkcs8_encrypted_der(block.contents(), pass.as_bytes())
        }
        other => {
            warn!(label = other, "skipping PEM block without a private key");
            return None;
        }
    };
    Some(key)
}
