//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero, categories, featured products)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (session database)
//!
//! # Products
//! GET  /products               - Product listing (?category=slug)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart, redirect to /cart
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /api/cart               - Cart snapshot (JSON)
//!
//! # Checkout
//! POST /checkout               - Redirect to hosted payment page
//! GET  /success                - Gateway return; clears the cart once paid
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//!
//! # Admin (requires admin role)
//! GET  /admin                  - Catalog dashboard
//! POST /admin/images           - Image upload (multipart, JSON response)
//! GET  /admin/products/new     - New product form
//! POST /admin/products         - Create product
//! GET  /admin/products/{id}/edit - Edit product form
//! POST /admin/products/{id}    - Update product
//! POST /admin/products/{id}/delete - Delete product
//! POST /admin/categories       - Create category
//! POST /admin/categories/{id}  - Update category
//! POST /admin/categories/{id}/delete - Delete category
//! POST /admin/hero             - Replace home page hero image (multipart)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/images", post(admin::upload_image))
        .route("/products", post(admin::create_product))
        .route("/products/new", get(admin::new_product))
        .route("/products/{id}", post(admin::update_product))
        .route("/products/{id}/edit", get(admin::edit_product))
        .route("/products/{id}/delete", post(admin::delete_product))
        .route("/categories", post(admin::create_category))
        .route("/categories/{id}", post(admin::update_category))
        .route("/categories/{id}/delete", post(admin::delete_category))
        .route("/hero", post(admin::set_hero))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/api/cart", get(cart::snapshot))
        .route("/checkout", post(checkout::checkout))
        .route("/success", get(checkout::success))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}
