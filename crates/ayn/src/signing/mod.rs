mod post;
mod protocol;
mod rsa;
mod signer;

pub use post::{EmbeddedKey, Post, Signature};
pub use protocol::{SignedPost, parse_sign_request, sign_post, verify_post};
pub use signer::{PostSigner, PostVerifier};
