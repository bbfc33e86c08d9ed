//! Private key ingestion.
//!
//! A key file is classified (PEM, DER, PKCS12, JCEKS) from an explicit hint,
//! its extension or its magic bytes, then every private key it holds is
//! parsed, decrypting password protected entries on demand.

mod extract;
mod format;
mod material;
mod pem;

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::error::KeyError;

pub use extract::{Keys, PasswordProvider, extract, extract_with};
pub use format::{KeyFileFormat, MAGIC_LEN, PeekReader, detect_format};
pub use material::{KeyMaterial, PublicKey};
pub use pem::{PemBlock, parse_blocks};

/// Reads every private key from the file at `path`.
///
/// All or nothing: a file with any unreadable entry, or with no private key
/// at all, is rejected as a whole.
pub fn read_private_keys<P: PasswordProvider>(
    path: &Path,
    hint: Option<&str>,
    password: P,
) -> Result<Vec<KeyMaterial>, KeyError> {
    let mut reader = PeekReader::new(File::open(path)?);
    let format = detect_format(&mut reader, path, hint)?;

    let keys = extract(format, reader, password)?.collect::<Result<Vec<_>, _>>()?;
    if keys.is_empty() {
        return Err(KeyError::KeyParse("no private key found".into()));
    }
    info!(file = %path.display(), %format, count = keys.len(), "read private keys");
    Ok(keys)
}
