#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use raynk_site::{
    AppConfig, AppState, InMemoryStore, MockMediaHost, StoreState, TokenKeys,
    auth::{Identity, SESSION_COOKIE},
    create_router, credentials,
    storage::MediaState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@raynklabs.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

const BOUNDARY: &str = "----raynk-test-boundary";

/// TestApp
///
/// The full router over an in-memory store and a recording media host. The
/// handles are kept so tests can inspect side effects directly.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub media: Arc<MockMediaHost>,
    pub tokens: TokenKeys,
    pub config: AppConfig,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::default(), MockMediaHost::new())
}

pub fn spawn_app_with(config: AppConfig, media: MockMediaHost) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let media = Arc::new(media);
    let tokens = TokenKeys::new(&config.jwt_secret);
    let credentials = credentials::build_verifier(&config, store.clone() as StoreState)
        .expect("test credentials");

    let state = AppState {
        store: store.clone() as StoreState,
        media: media.clone() as MediaState,
        credentials,
        tokens: tokens.clone(),
        config: config.clone(),
    };

    TestApp {
        router: create_router(state),
        store,
        media,
        tokens,
        config,
    }
}

impl TestApp {
    pub fn store_state(&self) -> StoreState {
        self.store.clone() as StoreState
    }

    /// A `Cookie` header value for a freshly signed static-mode session.
    pub fn admin_cookie(&self) -> String {
        self.cookie_for(ADMIN_EMAIL)
    }

    pub fn cookie_for(&self, email: &str) -> String {
        let token = self
            .tokens
            .sign(&Identity {
                admin_id: None,
                email: email.to_string(),
                role: "admin".to_string(),
            })
            .expect("sign test token");
        format!("{SESSION_COOKIE}={token}")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(empty_request(Method::GET, uri, cookie)).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        self.send(json_request(method, uri, body, cookie)).await
    }

    /// Creates a document through the admin API and returns its JSON.
    pub async fn create(&self, path: &str, body: Value) -> Value {
        let cookie = self.admin_cookie();
        let response = self
            .json(Method::POST, &format!("/api/admin/{path}"), body, Some(&cookie))
            .await;
        assert_eq!(response.status(), 201, "create {path} failed");
        read_json(response).await
    }
}

pub fn empty_request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A file part of a multipart body: (field, file name, content type, bytes).
pub type FilePart<'a> = (&'a str, &'a str, &'a str, &'a [u8]);

pub fn multipart_request(
    method: Method,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((field, file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn message_of(response: Response<Body>) -> String {
    read_json(response).await["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

pub fn id_of(document: &Value) -> String {
    document["id"].as_str().expect("document id").to_string()
}
