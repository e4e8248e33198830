//! Session-backed cart store.
//!
//! The cart lives in the visitor's session under [`CART_STORAGE_KEY`] as a
//! JSON snapshot (`{"items": [...], "total": "..."}`), so it survives page
//! reloads and restarts of the storefront. Every mutation loads the snapshot,
//! applies one [`Cart`] operation and puts the result back into the session;
//! the session layer writes it to the store once the response is ready.
//!
//! Requests on the same session are serialized by
//! [`crate::middleware::session_lock_middleware`], which wraps the session
//! layer, so each mutation is a read-modify-write that no other request on
//! that session can interleave with.
//!
//! Storage failures never reach the caller: an unreadable snapshot is logged,
//! dropped and replaced by an empty cart, and a failed write is logged and
//! the in-memory result is still returned.

use axum::{extract::FromRequestParts, http::request::Parts};
use shesha_core::{Cart, LineItemId, NewLineItem};
use tower_sessions::Session;
use tracing::{error, warn};

use crate::error::AppError;
use crate::models::session_keys;

/// Session key holding the cart snapshot.
pub const CART_STORAGE_KEY: &str = session_keys::CART_STORAGE;

/// The current visitor's cart.
///
/// Every operation returns the resulting cart.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(cart: CartStore) -> impl IntoResponse {
///     let cart = cart.snapshot().await;
///     format!("{} items", cart.item_count())
/// }
/// ```
#[derive(Clone)]
pub struct CartStore {
    session: Session,
}

impl CartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Current cart contents.
    pub async fn snapshot(&self) -> Cart {
        self.load().await
    }

    /// Add a product, or bump its quantity if it is already in the cart.
    pub async fn add_item(&self, candidate: NewLineItem) -> Cart {
        self.mutate(|cart| {
            cart.add_item(candidate);
        })
        .await
    }

    /// Remove a line. Unknown ids leave the cart unchanged.
    pub async fn remove_item(&self, id: &LineItemId) -> Cart {
        self.mutate(|cart| {
            cart.remove_item(id);
        })
        .await
    }

    /// Set a line's quantity. Values below 1 and unknown ids are ignored.
    pub async fn update_quantity(&self, id: &LineItemId, quantity: i64) -> Cart {
        self.mutate(|cart| {
            cart.update_quantity(id, quantity);
        })
        .await
    }

    /// Empty the cart.
    pub async fn clear(&self) -> Cart {
        self.mutate(Cart::clear).await
    }

    async fn mutate(&self, apply: impl FnOnce(&mut Cart)) -> Cart {
        let mut cart = self.load().await;
        apply(&mut cart);
        self.persist(&cart).await;
        cart
    }

    async fn load(&self) -> Cart {
        let value = match self.session.get_value(CART_STORAGE_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => return Cart::new(),
            Err(e) => {
                error!(error = %e, "Failed to read cart from session");
                return Cart::new();
            }
        };

        match serde_json::from_value::<Cart>(value) {
            Ok(cart) => cart,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cart snapshot");
                if let Err(e) = self.session.remove_value(CART_STORAGE_KEY).await {
                    error!(error = %e, "Failed to remove cart snapshot");
                }
                Cart::new()
            }
        }
    }

    async fn persist(&self, cart: &Cart) {
        if let Err(e) = self.session.insert(CART_STORAGE_KEY, cart).await {
            error!(error = %e, "Failed to write cart to session");
        }
    }
}

impl<S> FromRequestParts<S> for CartStore
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use shesha_core::{Price, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn candidate(product: &str, units: u32) -> NewLineItem {
        NewLineItem {
            product_id: ProductId::new(product),
            name: product.to_string(),
            price: Price::from_units(units),
            image: String::new(),
        }
    }

    fn store(session: Session) -> CartStore {
        CartStore::new(session)
    }

    #[tokio::test]
    async fn test_empty_session_has_empty_cart() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let cart = store(session).snapshot().await;
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[tokio::test]
    async fn test_mutations_persist_in_session() {
        let backing = Arc::new(MemoryStore::default());
        let session = Session::new(None, backing.clone(), None);
        let carts = store(session.clone());

        carts.add_item(candidate("vase", 25)).await;
        let cart = carts.add_item(candidate("vase", 25)).await;
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Price::from_units(50));

        // What the session layer does at the end of a request.
        session.save().await.unwrap();

        // A fresh handle on the same stored session sees the cart.
        let id = session.id().unwrap();
        let reloaded = store(Session::new(Some(id), backing, None)).snapshot().await;
        assert_eq!(reloaded, cart);
    }

    #[tokio::test]
    async fn test_update_remove_clear() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let carts = store(session);

        let cart = carts.add_item(candidate("lamp", 40)).await;
        let line = cart.items()[0].id.clone();

        let cart = carts.update_quantity(&line, 0).await;
        assert_eq!(cart.items()[0].quantity.get(), 1);

        let cart = carts.update_quantity(&line, 3).await;
        assert_eq!(cart.total(), Price::from_units(120));

        let cart = carts.remove_item(&LineItemId::new("missing")).await;
        assert_eq!(cart.items().len(), 1);

        assert!(carts.remove_item(&line).await.is_empty());

        carts.add_item(candidate("lamp", 40)).await;
        assert!(carts.clear().await.is_empty());
        assert!(carts.clear().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_empty() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert_value(CART_STORAGE_KEY, serde_json::json!({"items": 3}))
            .await
            .unwrap();

        let carts = store(session.clone());
        assert!(carts.snapshot().await.is_empty());
        assert!(session.get_value(CART_STORAGE_KEY).await.unwrap().is_none());

        let cart = carts.add_item(candidate("vase", 25)).await;
        assert_eq!(cart.items().len(), 1);
    }
}
