use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use ayn::config::Endpoint;
use ayn::{AppState, KeyRing, MemoryStore, PostStore, load_key, router, run, verify_post};

fn test_state() -> AppState {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rsa1024.pem");
    let key = load_key(&path, None, |_: &str| String::new()).unwrap();
    AppState {
        keys: Arc::new([("k1".to_string(), key)].into_iter().collect::<KeyRing>()),
        store: Arc::new(MemoryStore::new()),
    }
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn sign_request(alias: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/sign/{alias}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn healthcheck_returns_200() {
    let (status, body) = send(
        test_state(),
        Request::builder().uri("/healthcheck").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"Ok");
}

#[tokio::test]
async fn sign_returns_and_stores_verifiable_post() {
    let state = test_state();
    let response = router(state.clone())
        .oneshot(sign_request("k1", r#"{"content":{"msg":"hello"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=UTF-8"
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();

    let post = verify_post(&body).unwrap();
    assert_eq!(post.content["msg"], "hello");
    assert_eq!(state.store.list().unwrap(), vec![body.to_vec()]);
}

#[tokio::test]
async fn posts_lists_stored_documents() {
    let state = test_state();
    for body in [r#"{"content":1}"#, r#"{"content":2}"#] {
        let (status, _) = send(state.clone(), sign_request("k1", body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        state,
        Request::builder().uri("/posts").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let posts: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(posts.len(), 2);
    let mut contents: Vec<_> = posts.iter().map(|p| p["content"].clone()).collect();
    contents.sort_by_key(|c| c.as_i64());
    assert_eq!(contents, vec![Value::from(1), Value::from(2)]);
}

#[tokio::test]
async fn empty_store_lists_empty_array() {
    let (status, body) = send(
        test_state(),
        Request::builder().uri("/posts").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"[]");
}

#[tokio::test]
async fn unknown_alias_returns_404() {
    let state = test_state();
    let (status, _) = send(state.clone(), sign_request("k2", r#"{"content":1}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.store.len().unwrap(), 0);
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let (status, _) = send(test_state(), sign_request("k1", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(test_state(), sign_request("k1", r#"{"msg":"no content"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_endpoint_accepts_and_rejects() {
    let state = test_state();
    let (_, signed) = send(state.clone(), sign_request("k1", r#"{"content":"x"}"#)).await;

    let verify = |body: Vec<u8>| {
        Request::builder()
            .method("POST")
            .uri("/verify")
            .body(Body::from(body))
            .unwrap()
    };

    let (status, body) = send(state.clone(), verify(signed.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap()["valid"], true);

    let tampered = String::from_utf8(signed).unwrap().replace("\"x\"", "\"y\"");
    let (status, _) = send(state, verify(tampered.into_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (status, _) = send(
        test_state(),
        Request::builder().uri("/nonexistent").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tls_endpoint_without_usable_files_fails_to_start() {
    let endpoint = Endpoint {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls_enabled: true,
        tls_cert_file: None,
        tls_key_file: None,
    };
    let err = run(&endpoint, test_state()).await.unwrap_err();
    assert!(format!("{err:#}").contains("tls_cert_file"), "{err:#}");

    let dir = tempfile::tempdir().unwrap();
    let endpoint = Endpoint {
        tls_cert_file: Some(dir.path().join("cert.pem")),
        tls_key_file: Some(dir.path().join("key.pem")),
        ..endpoint
    };
    let err = run(&endpoint, test_state()).await.unwrap_err();
    assert!(format!("{err:#}").contains("loading TLS certificate"), "{err:#}");
}
