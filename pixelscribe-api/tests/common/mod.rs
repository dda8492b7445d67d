//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - Router built against a mock ClipDrop server and an in-memory ledger
//! - A funded test account and its token
//! - Multipart body building and JSON response helpers
//!
//! The pool is lazy and points nowhere, so only routes that really touch
//! PostgreSQL need a running instance.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use pixelscribe_api::app::{build_router, AppState};
use pixelscribe_api::config::Config;
use pixelscribe_shared::auth::jwt::issue_for_account;
use pixelscribe_shared::credits::{CreditLedger, MemoryLedger, PgLedger};
use pixelscribe_shared::db::migrations::run_migrations;
use pixelscribe_shared::db::pool::{create_lazy_pool, create_pool, DatabaseConfig};
use pixelscribe_shared::search::DocIndex;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
const BOUNDARY: &str = "pixelscribe-test-boundary";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub vendor: MockServer,
    pub ledger: Arc<MemoryLedger>,
    pub account_id: Uuid,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a context whose account holds `balance` credits
    pub async fn new(balance: i32) -> anyhow::Result<Self> {
        Self::with_docs(balance, DocIndex::empty()).await
    }

    /// Same as [`TestContext::new`] with a prepared document index
    pub async fn with_docs(balance: i32, docs: DocIndex) -> anyhow::Result<Self> {
        let vendor = MockServer::start().await;
        let vendor_url = vendor.uri();

        let config = Config::from_lookup(|key: &str| match key {
            "DATABASE_URL" => Some("postgresql://127.0.0.1:1/unused".to_string()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            "CLIPDROP_API" => Some("clipdrop-test-key".to_string()),
            "CLIPDROP_BASE_URL" => Some(vendor_url.clone()),
            "VENDOR_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })?;

        let db = create_lazy_pool(&DatabaseConfig {
            url: config.database.url.clone(),
            min_connections: 0,
            acquire_timeout_seconds: 1,
            ..Default::default()
        })?;

        let ledger = Arc::new(MemoryLedger::new());
        let account_id = Uuid::new_v4();
        ledger.set_balance(account_id, balance).await;

        let jwt_token =
            issue_for_account(account_id, JWT_SECRET, chrono::Duration::hours(1))?;

        let state = AppState::new(db, config, ledger.clone(), docs)?;
        let app = build_router(state);

        Ok(TestContext {
            app,
            vendor,
            ledger,
            account_id,
            jwt_token,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Current ledger balance of the test account
    pub async fn balance(&self) -> i32 {
        self.ledger
            .balance(self.account_id)
            .await
            .expect("ledger lookup")
            .expect("test account exists")
    }

    /// Sends a request through the router and decodes the JSON body
    pub async fn send(&self, request: Request<Body>) -> serde_json::Value {
        send(&self.app, request).await
    }

    /// POSTs a multipart form to `uri` with the test account's token
    pub async fn post_form(&self, uri: &str, form: MultipartBody) -> serde_json::Value {
        let request = form.into_request(uri, Some(&self.auth_header()));
        self.send(request).await
    }
}

/// Router backed by the PostgreSQL instance in `DATABASE_URL`
pub async fn database_app() -> anyhow::Result<Router> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let config = Config::from_lookup(|key: &str| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        "CLIPDROP_API" => Some("clipdrop-test-key".to_string()),
        _ => None,
    })?;

    let db = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        ..Default::default()
    })
    .await?;
    run_migrations(&db).await?;

    let ledger = Arc::new(PgLedger::new(db.clone()));
    let state = AppState::new(db, config, ledger, DocIndex::empty())?;
    Ok(build_router(state))
}

/// Sends a request through `app` and decodes the JSON body
pub async fn send(app: &Router, request: Request<Body>) -> serde_json::Value {
    let response = app.clone().oneshot(request).await.expect("router call");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&body).expect("JSON response")
}

/// Builds a JSON POST request
pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Hand-built `multipart/form-data` body
#[derive(Debug, Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain text field
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Adds a file field
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Adds a small PNG under the `image` field
    pub fn image(self) -> Self {
        self.file("image", "photo.png", "image/png", b"\x89PNG fake image")
    }

    /// Finishes the body and wraps it in a POST request
    pub fn into_request(mut self, uri: &str, authorization: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        builder.body(Body::from(self.body)).expect("request")
    }
}
