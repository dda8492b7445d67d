//! Image generation route tests.

mod common;

use common::{json_request, TestContext};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const ROUTE: &str = "/api/image/generate-image";

fn authorized(ctx: &TestContext, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    let mut request = json_request(ROUTE, body);
    request
        .headers_mut()
        .insert("token", ctx.jwt_token.parse().unwrap());
    request
}

#[tokio::test]
async fn test_generate_image_debits_one_credit() {
    let ctx = TestContext::new(3).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/text-to-image/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"abc".to_vec(), "image/png"))
        .expect(1)
        .mount(&ctx.vendor)
        .await;

    let body = ctx
        .send(authorized(&ctx, json!({ "prompt": "a fox reading a map" })))
        .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Image Generated");
    assert_eq!(body["resultImage"], "data:image/png;base64,YWJj");
    assert_eq!(body["creditBalance"], 2);
    assert_eq!(ctx.balance().await, 2);

    let requests = ctx.vendor.received_requests().await.unwrap();
    let sent = String::from_utf8_lossy(&requests[0].body);
    assert!(sent.contains("a fox reading a map"));
    assert!(!sent.contains("name=\"image_file\""));
}

#[tokio::test]
async fn test_generate_image_requires_prompt() {
    let ctx = TestContext::new(3).await.unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.vendor)
        .await;

    let body = ctx.send(authorized(&ctx, json!({ "prompt": "   " }))).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing Details");

    let body = ctx.send(authorized(&ctx, json!({}))).await;
    assert_eq!(body["message"], "Missing Details");

    assert_eq!(ctx.balance().await, 3);
}

#[tokio::test]
async fn test_generate_image_zero_balance() {
    let ctx = TestContext::new(0).await.unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.vendor)
        .await;

    let body = ctx
        .send(authorized(&ctx, json!({ "prompt": "a fox reading a map" })))
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No Credit Balance");
    assert_eq!(body["creditBalance"], 0);
}

#[tokio::test]
async fn test_generate_image_vendor_failure_refunds() {
    let ctx = TestContext::new(1).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/text-to-image/v1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Prompt rejected" })),
        )
        .expect(1)
        .mount(&ctx.vendor)
        .await;

    let body = ctx
        .send(authorized(&ctx, json!({ "prompt": "a fox reading a map" })))
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Prompt rejected");
    assert_eq!(body["creditBalance"], 1);
    assert_eq!(ctx.balance().await, 1);
}

#[tokio::test]
async fn test_generate_image_requires_token() {
    let ctx = TestContext::new(1).await.unwrap();

    let body = ctx
        .send(json_request(ROUTE, json!({ "prompt": "a fox reading a map" })))
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not Authorized. Login Again");
    assert_eq!(ctx.balance().await, 1);
}
