use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{info, warn};

use crate::config::KeyConfig;
use crate::error::{KeyError, PostError};
use crate::key::{KeyMaterial, PasswordProvider, read_private_keys};
use crate::signing::{SignedPost, parse_sign_request, sign_post};

/// Loads the key an alias refers to from one key file.
///
/// When the file holds several keys the last one wins.
pub fn load_key<P: PasswordProvider>(
    path: &Path,
    hint: Option<&str>,
    password: P,
) -> Result<KeyMaterial, KeyError> {
    let mut keys = read_private_keys(path, hint, password)?;
    if keys.len() > 1 {
        info!(file = %path.display(), count = keys.len(), "key file holds several keys, using the last");
    }
    keys.pop()
        .ok_or_else(|| KeyError::KeyParse("no private key found".into()))
}

/// Signing keys by alias.
///
/// Built once at startup and never mutated afterwards, so it can be shared
/// between request handlers without locking.
#[derive(Debug, Default)]
pub struct KeyRing {
    keys: HashMap<String, KeyMaterial>,
}

impl KeyRing {
    /// Loads every configured key.
    ///
    /// A key that fails to load is logged and left out; requests naming its
    /// alias fail with `UnknownAlias`.
    pub fn load(configs: &BTreeMap<String, KeyConfig>) -> Self {
        let mut keys = HashMap::new();
        for (alias, config) in configs {
            let password = config.password.clone().unwrap_or_default();
            match load_key(&config.path, config.format.as_deref(), |_: &str| password.clone()) {
                Ok(key) => {
                    info!(%alias, scheme = key.scheme(), bits = key.bits(), "loaded signing key");
                    keys.insert(alias.clone(), key);
                }
                Err(e) => {
                    warn!(%alias, file = %config.path.display(), error = %e, "failed to load signing key");
                }
            }
        }
        Self { keys }
    }

    pub fn get(&self, alias: &str) -> Option<&KeyMaterial> {
        self.keys.get(alias)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Signs the `content` of a raw sign request with the key named `alias`.
    pub fn sign(&self, alias: &str, body: &[u8]) -> Result<SignedPost, PostError> {
        let key = self
            .get(alias)
            .ok_or_else(|| PostError::UnknownAlias(alias.to_string()))?;
        let content = parse_sign_request(body)?;
        sign_post(content, key)
    }
}

impl FromIterator<(String, KeyMaterial)> for KeyRing {
    fn from_iter<I: IntoIterator<Item = (String, KeyMaterial)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
