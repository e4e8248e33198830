//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session (see [`crate::cart_store`]).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shesha_core::{Cart, CurrencyCode, LineItemId, ProductId, media};
use tracing::instrument;

use crate::cart_store::CartStore;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Event fired for HTMX listeners after any cart change.
pub const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Line thumbnail size.
const THUMB_SIZE: u32 = 160;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    id: item.id.to_string(),
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    quantity: item.quantity.get(),
                    price: item.price.format(currency),
                    line_price: item.line_total().format(currency),
                    image: Some(item.image.as_str())
                        .filter(|url| !url.is_empty())
                        .map(|url| media::derive_url(url, THUMB_SIZE, THUMB_SIZE)),
                })
                .collect(),
            total: cart.total().format(currency),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data.
///
/// Signed so that zero and negative requests reach the cart and are ignored
/// there rather than failing to parse.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(state, cart))]
pub async fn show(State(state): State<AppState>, cart: CartStore) -> CartShowTemplate {
    let cart = cart.snapshot().await;
    CartShowTemplate {
        cart: CartView::new(&cart, state.config().stripe.currency),
        error: None,
    }
}

/// Add a product to the cart (HTMX).
///
/// The product is looked up in the catalog so the line carries the current
/// name, price and image. Returns the count badge with an HTMX trigger.
#[instrument(skip(state, cart))]
pub async fn add(
    State(state): State<AppState>,
    cart: CartStore,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let product = state
        .catalog()
        .get_product(&product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let updated = cart.add_item(product.to_line_candidate()).await;
    add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));

    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartCountTemplate {
            count: updated.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, cart))]
pub async fn update(
    State(state): State<AppState>,
    cart: CartStore,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let updated = cart
        .update_quantity(&LineItemId::new(form.line_id), form.quantity)
        .await;

    (
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::new(&updated, state.config().stripe.currency),
        },
    )
        .into_response()
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, cart))]
pub async fn remove(
    State(state): State<AppState>,
    cart: CartStore,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let updated = cart.remove_item(&LineItemId::new(form.line_id)).await;

    (
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::new(&updated, state.config().stripe.currency),
        },
    )
        .into_response()
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(cart: CartStore) -> Redirect {
    cart.clear().await;
    Redirect::to("/cart")
}

/// Get cart count badge (HTMX).
#[instrument(skip(cart))]
pub async fn count(cart: CartStore) -> CartCountTemplate {
    CartCountTemplate {
        count: cart.snapshot().await.item_count(),
    }
}

/// Cart snapshot as JSON (`{"items": [...], "total": "..."}`).
#[instrument(skip(cart))]
pub async fn snapshot(cart: CartStore) -> Json<Cart> {
    Json(cart.snapshot().await)
}
