//! Axum preview router tests.
//!
//! Run with: cargo test --features preview-axum --test preview_test

#![cfg(feature = "preview-axum")]

use std::sync::Arc;

use chrono::Utc;
use http_body_util::BodyExt;
use mailproof::preview::preview_router;
use mailproof::preview::reexports::*;
use mailproof::{LineItem, MemoryOrderStore, Money, Order, PreviewHandler, Principal};
use tower::ServiceExt;

fn create_handler() -> Arc<PreviewHandler> {
    let orders = MemoryOrderStore::shared();
    orders.insert(
        Order::new(42, Utc::now())
            .item(LineItem::new("Cast Iron Kettle", 1, Money(3900)))
            .item(LineItem::new("Sencha Tea", 2, Money(1200))),
    );
    Arc::new(PreviewHandler::builder("secret", orders).build())
}

fn create_empty_handler() -> Arc<PreviewHandler> {
    Arc::new(PreviewHandler::builder("secret", MemoryOrderStore::shared()).build())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String, String) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::HOST, "shop.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

/// First preview link on the settings page, as a path and query.
fn first_preview_link(page: &str) -> String {
    let start = page.find("href=\"").expect("preview link") + "href=\"".len();
    let end = start + page[start..].find('"').unwrap();
    let href = page[start..end].replace("&amp;", "&");
    href.strip_prefix("http://shop.test").unwrap().to_string()
}

// ============================================================================
// Settings page
// ============================================================================

#[tokio::test]
async fn test_settings_page_lists_templates_with_preview_links() {
    let app = preview_router(create_handler(), Principal::store_manager("admin"));

    let (status, content_type, body) = get(app, "/?page=wc-settings&tab=email").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.contains("text/html"));
    assert!(body.contains("Email notifications"));
    assert!(body.contains(">Preview</th>"));
    assert!(body.contains("button button-secondary"));
    assert!(body.contains("target=\"_blank\""));
    assert!(body.contains("page=wc-settings"));
}

#[tokio::test]
async fn test_settings_page_without_orders() {
    let app = preview_router(create_empty_handler(), Principal::store_manager("admin"));

    let (status, _, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Preview will be available once an order has been placed."));
    assert!(!body.contains("button-secondary"));
}

// ============================================================================
// Preview
// ============================================================================

#[tokio::test]
async fn test_preview_link_renders_email() {
    let handler = create_handler();
    let principal = Principal::store_manager("admin");

    let (_, _, page) = get(preview_router(handler.clone(), principal.clone()), "/").await;
    let link = first_preview_link(&page);
    assert!(link.contains("action=preview_email"));

    let (status, content_type, body) = get(preview_router(handler, principal), &link).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.contains("text/html"));
    assert!(body.contains("#42"));
}

#[tokio::test]
async fn test_preview_without_nonce_is_forbidden() {
    let app = preview_router(create_handler(), Principal::store_manager("admin"));

    let (status, content_type, body) =
        get(app, "/?action=preview_email&type=new_order&order=42").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(content_type.contains("text/plain"));
    assert_eq!(body, "Invalid request");
}

#[tokio::test]
async fn test_preview_unknown_type() {
    let handler = create_handler();
    let nonce = handler.issue_token("not_a_real_type");
    let app = preview_router(handler, Principal::store_manager("admin"));

    let uri = format!("/?action=preview_email&type=not_a_real_type&order=42&nonce={}", nonce);
    let (status, _, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Email type not_a_real_type doesn't exist");
}

#[tokio::test]
async fn test_preview_as_customer_is_forbidden() {
    let handler = create_handler();
    let nonce = handler.issue_token("new_order");
    let app = preview_router(handler, Principal::new("customer"));

    let uri = format!("/?action=preview_email&type=new_order&order=42&nonce={}", nonce);
    let (status, _, _) = get(app, &uri).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// JSON API
// ============================================================================

#[tokio::test]
async fn test_json_lists_email_types() {
    let app = preview_router(create_handler(), Principal::store_manager("admin"));

    let (status, content_type, body) = get(app, "/json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.contains("application/json"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), mailproof::DEFAULT_EMAIL_TYPES.len());
    assert_eq!(json["latest_order"], 42);

    let new_order = data.iter().find(|t| t["key"] == "new_order").unwrap();
    assert_eq!(new_order["template_id"], "WC_Email_New_Order");
    assert_eq!(new_order["active"], true);

    let renewal = data
        .iter()
        .find(|t| t["key"] == "customer_renewal_invoice")
        .unwrap();
    assert_eq!(renewal["active"], false);
}
