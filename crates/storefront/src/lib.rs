//! Shesha Storefront library.
//!
//! This crate provides the storefront as a library so the binary and the
//! integration tests build the same router.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for interactivity
//! - Askama templates for server-side rendering
//! - Firestore for the product catalog (read-only)
//! - Firebase Auth for sign-in, Stripe Checkout for payment, Cloudinary for images
//! - `SQLite`-backed sessions holding each visitor's cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart_store;
pub mod cloudinary;
pub mod config;
pub mod error;
pub mod firebase;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;

use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router with its session, request id and tracing
/// layers. Sentry layers are added by the binary.
///
/// Static assets sit outside the session and session lock layers.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_lock_middleware,
        ))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
