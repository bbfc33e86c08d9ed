use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use serde_json::json;
use tracing::info;

use crate::config::Endpoint;
use crate::error::ServerError;
use crate::keyring::KeyRing;
use crate::signing::verify_post;
use crate::store::PostStore;

const JSON_UTF8: &str = "application/json; charset=UTF-8";

#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<KeyRing>,
    pub store: Arc<dyn PostStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(|| async move { (StatusCode::OK, "Ok").into_response() }))
        .route("/sign/{key}", post(sign_handler))
        .route("/posts", get(posts_handler))
        .route("/verify", post(verify_handler))
        .with_state(state)
}

/// Serves the sign endpoint until the listener fails, over TLS when the
/// endpoint enables it.
pub async fn run(endpoint: &Endpoint, state: AppState) -> Result<()> {
    let tls = endpoint.tls()?;
    let addr = endpoint.addr();
    let keys = state.keys.len();
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    let Some(tls) = tls else {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        info!(addr = %listener.local_addr()?, keys, "serving sign endpoint");
        axum::serve(listener, app).await.context("serving http")?;
        return Ok(());
    };

    let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .with_context(|| {
            format!(
                "loading TLS certificate {} and key {}",
                tls.cert.display(),
                tls.key.display()
            )
        })?;
    let socket = tokio::net::lookup_host(addr.as_str())
        .await
        .with_context(|| format!("resolving {addr}"))?
        .next()
        .with_context(|| format!("{addr} resolves to no address"))?;
    info!(addr = %socket, keys, "serving sign endpoint over TLS");

    axum_server::bind_rustls(socket, rustls)
        .serve(app)
        .await
        .context("serving https")?;

    Ok(())
}

/// Runs blocking work (RSA, SQLite) off the async workers.
async fn blocking<F, T>(f: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, ServerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Task(e.to_string()))?
}

async fn sign_handler(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    body: Bytes,
) -> Result<Response, ServerError> {
    let data = blocking(move || {
        let signed = state.keys.sign(&alias, &body)?;
        state.store.put(signed.signature(), &signed.data)?;
        info!(%alias, bytes = signed.data.len(), "signed post");
        Ok(signed.data)
    })
    .await?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, JSON_UTF8)], data).into_response())
}

async fn posts_handler(State(state): State<AppState>) -> Result<Response, ServerError> {
    let posts = blocking(move || Ok(state.store.list()?)).await?;

    let mut body = Vec::with_capacity(posts.iter().map(|p| p.len() + 1).sum::<usize>() + 2);
    body.push(b'[');
    for (i, post) in posts.iter().enumerate() {
        if i > 0 {
            body.push(b',');
        }
        body.extend_from_slice(post);
    }
    body.push(b']');

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, JSON_UTF8)], body).into_response())
}

async fn verify_handler(body: Bytes) -> Result<Response, ServerError> {
    blocking(move || Ok(verify_post(&body)?)).await?;
    Ok((StatusCode::OK, Json(json!({"valid": true}))).into_response())
}
