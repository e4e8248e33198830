//! Checkout route handlers.
//!
//! Checkout hands the cart to the payment gateway's hosted page. The cart is
//! only cleared once the buyer comes back to `/success` and the gateway
//! confirms the session is settled.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use super::cart::{CartShowTemplate, CartView};
use crate::cart_store::CartStore;
use crate::error::add_breadcrumb;
use crate::services::CheckoutRequest;
use crate::state::AppState;
use crate::stripe::SESSION_ID_PLACEHOLDER;

const CHECKOUT_FAILED: &str = "We couldn't start checkout. Please try again in a moment.";

/// Query parameters on the gateway's return URL.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

/// Outcome shown on the success page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Payment confirmed; cart cleared.
    Confirmed,
    /// Gateway says the session is not paid (yet).
    Pending,
    /// No session to verify, or the gateway could not be reached.
    Unknown,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub outcome: OrderOutcome,
}

impl SuccessTemplate {
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.outcome == OrderOutcome::Confirmed
    }

    #[must_use]
    pub fn pending(&self) -> bool {
        self.outcome == OrderOutcome::Pending
    }
}

/// Start checkout: create a gateway session and redirect to it.
///
/// On failure the cart page is shown again with a message and the cart is
/// left untouched.
#[instrument(skip(state, cart))]
pub async fn checkout(State(state): State<AppState>, cart: CartStore) -> Response {
    let current = cart.snapshot().await;
    if current.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let config = state.config();
    let request = CheckoutRequest::from_cart(
        &current,
        config.stripe.currency,
        config.url_for(&format!("/success?session_id={SESSION_ID_PLACEHOLDER}")),
        config.url_for("/cart"),
    );

    let session = match request {
        Ok(request) => state.payments().create_session(&request).await,
        Err(e) => Err(e),
    };

    match session {
        Ok(session) => {
            add_breadcrumb(
                "checkout",
                "Redirecting to payment",
                Some(&[("session_id", session.id.as_str())]),
            );
            Redirect::to(&session.url).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create checkout session");
            (
                StatusCode::BAD_GATEWAY,
                CartShowTemplate {
                    cart: CartView::new(&current, config.stripe.currency),
                    error: Some(CHECKOUT_FAILED.to_string()),
                },
            )
                .into_response()
        }
    }
}

/// Return from the gateway.
///
/// Clears the cart only when the gateway reports the session as paid (or
/// needing no payment).
#[instrument(skip(state, cart))]
pub async fn success(
    State(state): State<AppState>,
    cart: CartStore,
    Query(query): Query<SuccessQuery>,
) -> SuccessTemplate {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return SuccessTemplate {
            outcome: OrderOutcome::Unknown,
        };
    };

    let outcome = match state.payments().session_status(&session_id).await {
        Ok(status) if status.is_settled() => {
            cart.clear().await;
            tracing::info!(session_id = %session_id, "Order confirmed, cart cleared");
            OrderOutcome::Confirmed
        }
        Ok(_) => OrderOutcome::Pending,
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to verify checkout session");
            OrderOutcome::Unknown
        }
    };

    SuccessTemplate { outcome }
}
