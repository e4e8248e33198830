//! Catalog pages, auth and admin gating.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use shesha_integration_tests::TestContext;

#[tokio::test]
async fn test_health_endpoints() {
    let mut ctx = TestContext::new().await;

    let live = ctx.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = ctx.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let mut ctx = TestContext::new().await;
    let response = ctx.get("/health").await;
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_home_shows_featured_products_and_categories() {
    let mut ctx = TestContext::new().await;

    let response = ctx.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Blue Vase"));
    assert!(!response.body.contains("Desk Lamp"));
    assert!(response.body.contains("Lighting"));
    assert!(response.body.contains("hero.jpg"));
}

#[tokio::test]
async fn test_product_listing_filters_by_category() {
    let mut ctx = TestContext::new().await;

    let all = ctx.get("/products").await;
    assert!(all.body.contains("Blue Vase"));
    assert!(all.body.contains("Desk Lamp"));

    let lighting = ctx.get("/products?category=lighting").await;
    assert_eq!(lighting.status, StatusCode::OK);
    assert!(lighting.body.contains("Desk Lamp"));
    assert!(!lighting.body.contains("Blue Vase"));
}

#[tokio::test]
async fn test_product_detail() {
    let mut ctx = TestContext::new().await;

    let response = ctx.get("/products/vase-01").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Blue Vase"));
    assert!(response.body.contains("$25.00"));

    let missing = ctx.get("/products/ghost").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_outage_is_bad_gateway() {
    let mut ctx = TestContext::new().await;
    ctx.catalog.set_failing(true);

    let response = ctx.get("/").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(!response.body.contains("catalog unavailable"));
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let mut ctx = TestContext::new().await;

    let page = ctx.get("/auth/login").await;
    assert_eq!(page.status, StatusCode::OK);

    let response = ctx.sign_in("admin@shop.test", "wrong").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Invalid email or password"));
}

#[tokio::test]
async fn test_admin_requires_sign_in() {
    let mut ctx = TestContext::new().await;

    let response = ctx.get("/admin").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/auth/login"));
}

#[tokio::test]
async fn test_admin_requires_admin_role() {
    let mut ctx = TestContext::new().await;

    let login = ctx.sign_in("buyer@shop.test", "battery-staple").await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
    assert_eq!(login.header("location"), Some("/"));

    let response = ctx.get("/admin").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let upload = ctx
        .post_file("/admin/images", "file", "vase.png", b"\x89PNG")
        .await;
    assert_eq!(upload.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_dashboard_and_upload() {
    let mut ctx = TestContext::new().await;

    let login = ctx.sign_in("admin@shop.test", "correct-horse").await;
    assert_eq!(login.header("location"), Some("/admin"));

    let dashboard = ctx.get("/admin").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.body.contains("Blue Vase"));
    assert!(dashboard.body.contains("c_fill,w_400,h_300"));
    assert!(dashboard.body.contains("lighting"));

    let upload = ctx
        .post_file("/admin/images", "file", "vase.png", b"\x89PNG")
        .await;
    assert_eq!(upload.status, StatusCode::OK);
    let body = upload.json();
    assert_eq!(
        body["url"],
        "https://res.cloudinary.com/shesha/image/upload/v1/vase.png"
    );
    assert_eq!(
        body["thumbnail_url"],
        "https://res.cloudinary.com/shesha/image/upload/c_fill,w_500,h_500/v1/vase.png"
    );

    let missing = ctx
        .post_file("/admin/images", "other", "vase.png", b"\x89PNG")
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_keeps_cart() {
    let mut ctx = TestContext::new().await;
    ctx.post_form("/cart/add", "product_id=vase-01").await;

    ctx.sign_in("buyer@shop.test", "battery-staple").await;
    assert_eq!(ctx.cart().await["total"], "25");

    let logout = ctx.post_form("/auth/logout", "").await;
    assert_eq!(logout.status, StatusCode::SEE_OTHER);
    assert_eq!(ctx.cart().await["total"], "25");

    // Signed out again.
    let admin = ctx.get("/admin").await;
    assert_eq!(admin.status, StatusCode::SEE_OTHER);
}
