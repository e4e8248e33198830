//! Checkout and payment-return flows.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use shesha_integration_tests::TestContext;
use shesha_storefront::services::PaymentStatus;

#[tokio::test]
async fn test_checkout_redirects_to_gateway() {
    let mut ctx = TestContext::new().await;
    ctx.post_form("/cart/add", "product_id=vase-01").await;
    ctx.post_form("/cart/add", "product_id=vase-01").await;
    ctx.post_form("/cart/add", "product_id=lamp-01").await;

    let response = ctx.post_form("/checkout", "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        Some("https://checkout.stripe.test/c/pay/cs_test_1")
    );

    let requests = ctx.gateway.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.lines.len(), 2);
    assert_eq!(request.lines[0].name, "Blue Vase");
    assert_eq!(request.lines[0].quantity, 2);
    assert_eq!(
        request.success_url,
        "http://shop.test/success?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(request.cancel_url, "http://shop.test/cart");

    // Nothing is cleared until payment is confirmed.
    assert_eq!(ctx.cart().await["total"], "115");
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let mut ctx = TestContext::new().await;
    ctx.post_form("/cart/add", "product_id=lamp-01").await;
    ctx.gateway.set_failing(true);

    let response = ctx.post_form("/checkout", "").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body.contains("start checkout"));
    assert!(response.body.contains("Desk Lamp"));

    let cart = ctx.cart().await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["total"], "65");
}

#[tokio::test]
async fn test_empty_cart_checkout_goes_back_to_cart() {
    let mut ctx = TestContext::new().await;

    let response = ctx.post_form("/checkout", "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/cart"));
    assert!(ctx.gateway.requests().is_empty());
}

#[tokio::test]
async fn test_paid_session_clears_cart() {
    let mut ctx = TestContext::new().await;
    ctx.post_form("/cart/add", "product_id=vase-01").await;
    ctx.post_form("/checkout", "").await;

    let response = ctx.get("/success?session_id=cs_test_1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Thank you for your order"));
    assert_eq!(ctx.cart().await["total"], "0");
}

#[tokio::test]
async fn test_unpaid_session_keeps_cart() {
    let mut ctx = TestContext::new().await;
    ctx.post_form("/cart/add", "product_id=vase-01").await;
    ctx.gateway.set_status(PaymentStatus::Unpaid);

    let response = ctx.get("/success?session_id=cs_test_1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Payment not completed"));
    assert_eq!(ctx.cart().await["total"], "25");
}

#[tokio::test]
async fn test_success_without_session_id_keeps_cart() {
    let mut ctx = TestContext::new().await;
    ctx.post_form("/cart/add", "product_id=vase-01").await;

    let response = ctx.get("/success").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ctx.cart().await["total"], "25");
}
