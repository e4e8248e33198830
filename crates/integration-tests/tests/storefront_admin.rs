//! Admin catalog editing: products, categories and the home page hero.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use shesha_core::{CategoryId, Price, ProductId};
use shesha_integration_tests::TestContext;

const PRODUCT_FORM: &str = "name=Green+Bowl&description=Hand+thrown&price=18.50&stock=3\
    &category=decor&cover_image=https%3A%2F%2Fimg.test%2Fbowl.jpg\
    &images=https%3A%2F%2Fimg.test%2Fa.jpg%0Ahttps%3A%2F%2Fimg.test%2Fb.jpg&featured=on";

async fn admin() -> TestContext {
    let mut ctx = TestContext::new().await;
    let login = ctx.sign_in("admin@shop.test", "correct-horse").await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
    ctx
}

#[tokio::test]
async fn test_create_product_appears_in_listing() {
    let mut ctx = admin().await;

    let form = ctx.get("/admin/products/new").await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Lighting"));

    let response = ctx.post_form("/admin/products", PRODUCT_FORM).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some("/admin"));

    let created = ctx
        .catalog
        .products()
        .into_iter()
        .find(|p| p.name == "Green Bowl")
        .unwrap();
    assert!(created.id.as_str().starts_with("green-bowl-"));
    assert_eq!(created.price, Price::from_cents(1850));
    assert_eq!(created.stock, 3);
    assert_eq!(created.images.len(), 2);
    assert!(created.featured);

    let listing = ctx.get("/products?category=decor").await;
    assert!(listing.body.contains("Green Bowl"));

    assert_eq!(ctx.catalog.write_tokens(), vec!["token-admin@shop.test"]);
}

#[tokio::test]
async fn test_invalid_product_form_is_shown_again() {
    let mut ctx = admin().await;
    let before = ctx.catalog.products().len();

    let response = ctx
        .post_form(
            "/admin/products",
            "name=Green+Bowl&price=abc&stock=3&category=decor&cover_image=https%3A%2F%2Fimg.test%2Fbowl.jpg",
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Price must be a non-negative number"));
    assert!(response.body.contains("Green Bowl"));

    let response = ctx
        .post_form("/admin/products", "name=Green+Bowl&price=5&stock=3&category=decor")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Cover image is required"));

    assert_eq!(ctx.catalog.products().len(), before);
    assert!(ctx.catalog.write_tokens().is_empty());
}

#[tokio::test]
async fn test_edit_and_delete_product() {
    let mut ctx = admin().await;

    let form = ctx.get("/admin/products/vase-01/edit").await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Blue Vase"));
    assert!(form.body.contains("/admin/products/vase-01"));

    let response = ctx
        .post_form(
            "/admin/products/vase-01",
            "name=Blue+Vase+XL&price=30&stock=1&category=decor&cover_image=https%3A%2F%2Fimg.test%2Fvase.jpg",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let detail = ctx.get("/products/vase-01").await;
    assert!(detail.body.contains("Blue Vase XL"));
    let updated = ctx
        .catalog
        .products()
        .into_iter()
        .find(|p| p.id == ProductId::new("vase-01"))
        .unwrap();
    assert!(!updated.featured);
    assert!(updated.images.is_empty());

    let response = ctx.post_form("/admin/products/vase-01/delete", "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(ctx.get("/products/vase-01").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_missing_product_is_not_found() {
    let mut ctx = admin().await;

    let form = ctx.get("/admin/products/nope/edit").await;
    assert_eq!(form.status, StatusCode::NOT_FOUND);

    let response = ctx
        .post_form(
            "/admin/products/nope",
            "name=Ghost&price=1&stock=1&category=decor&cover_image=https%3A%2F%2Fimg.test%2Fg.jpg",
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_lifecycle() {
    let mut ctx = admin().await;

    let response = ctx
        .post_form(
            "/admin/categories",
            "name=Garden+Tools&image_url=https%3A%2F%2Fimg.test%2Fgarden.jpg",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let created = ctx
        .catalog
        .categories()
        .into_iter()
        .find(|c| c.name == "Garden Tools")
        .unwrap();
    assert_eq!(created.slug, "garden-tools");
    assert!(ctx.get("/").await.body.contains("Garden Tools"));

    let response = ctx
        .post_form(
            &format!("/admin/categories/{}", created.id),
            "name=Garden&slug=garden&image_url=https%3A%2F%2Fimg.test%2Fgarden2.jpg",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let updated = ctx
        .catalog
        .categories()
        .into_iter()
        .find(|c| c.id == created.id)
        .unwrap();
    assert_eq!(updated.slug, "garden");
    assert_eq!(updated.image_url.as_deref(), Some("https://img.test/garden2.jpg"));

    let response = ctx
        .post_form(&format!("/admin/categories/{}/delete", created.id), "")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(ctx.catalog.categories().iter().all(|c| c.id != created.id));
}

#[tokio::test]
async fn test_category_requires_image() {
    let mut ctx = admin().await;

    let response = ctx.post_form("/admin/categories", "name=Garden").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Category image is required"));

    let response = ctx
        .post_form(
            "/admin/categories/c9",
            "name=Garden&image_url=https%3A%2F%2Fimg.test%2Fgarden.jpg",
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(ctx.catalog.categories().iter().all(|c| c.id != CategoryId::new("c9")));
}

#[tokio::test]
async fn test_hero_upload_replaces_home_hero() {
    let mut ctx = admin().await;

    let response = ctx
        .post_file("/admin/hero", "file", "spring.png", b"\x89PNG")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let home = ctx.get("/").await;
    assert!(home.body.contains("spring.png"));
    assert!(!home.body.contains("hero.jpg"));

    let missing = ctx
        .post_file("/admin/hero", "other", "spring.png", b"\x89PNG")
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_writes_require_admin() {
    let mut ctx = TestContext::new().await;

    let anonymous = ctx.post_form("/admin/products", PRODUCT_FORM).await;
    assert_eq!(anonymous.status, StatusCode::SEE_OTHER);
    assert_eq!(anonymous.header("location"), Some("/auth/login"));

    ctx.sign_in("buyer@shop.test", "battery-staple").await;
    for (uri, form) in [
        ("/admin/products", PRODUCT_FORM),
        ("/admin/products/vase-01/delete", ""),
        ("/admin/categories", "name=X&image_url=https%3A%2F%2Fimg.test%2Fx.jpg"),
        ("/admin/categories/c1/delete", ""),
    ] {
        let response = ctx.post_form(uri, form).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{uri}");
    }
    let hero = ctx
        .post_file("/admin/hero", "file", "spring.png", b"\x89PNG")
        .await;
    assert_eq!(hero.status, StatusCode::FORBIDDEN);

    assert_eq!(ctx.catalog.products().len(), 2);
    assert_eq!(ctx.catalog.categories().len(), 2);
    assert!(ctx.catalog.write_tokens().is_empty());
}
