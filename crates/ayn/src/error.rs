use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::key::KeyFileFormat;

/// Failures while reading private keys out of a key file.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("unable to guess key file format")]
    UnrecognizedFormat,
    #[error("key file format {0} is not supported")]
    UnsupportedFormat(KeyFileFormat),
    #[error("unable to read key file: {0}")]
    Io(#[from] std::io::Error),
    #[error("error decrypting password protected private key: {0}")]
    KeyDecrypt(String),
    #[error("error parsing private key: {0}")]
    KeyParse(String),
}

/// Failures of the sign and verify operations.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("unknown key alias: {0}")]
    UnknownAlias(String),
    #[error("unable to encode public key: {0}")]
    KeySerialization(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("unable to parse embedded public key: {0}")]
    KeyParse(String),
    #[error("signature does not match document")]
    SignatureMismatch,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("post store lock poisoned")]
    Poisoned,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("request task failed: {0}")]
    Task(String),
}

/// Trait implementation to convert this error into an axum http response
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Post(PostError::UnknownAlias(_)) => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            ServerError::Post(
                PostError::MalformedDocument(_)
                | PostError::KeyParse(_)
                | PostError::SignatureMismatch,
            ) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something wrong happened.",
            )
                .into_response(),
        }
    }
}
