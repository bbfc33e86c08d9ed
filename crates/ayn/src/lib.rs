pub mod config;
pub mod encoding;
pub mod error;
pub mod key;
pub mod keyring;
pub mod server;
pub mod signing;
pub mod store;

pub use config::Config;
pub use error::{KeyError, PostError, ServerError, StoreError};
pub use key::{KeyFileFormat, KeyMaterial, PublicKey};
pub use keyring::{KeyRing, load_key};
pub use server::{AppState, router, run};
pub use signing::{Post, SignedPost, sign_post, verify_post};
pub use store::{MemoryStore, PostStore, SqliteStore};
