//! The shopping cart state machine.
//!
//! A [`Cart`] is an ordered list of [`LineItem`]s plus a derived total. It is
//! only mutated through four operations (add, remove, update quantity, clear),
//! each of which recomputes the total before returning, so
//! `total == Σ price × quantity` holds in every reachable state.
//!
//! The cart knows nothing about where it is stored. Its serialized form is the
//! [`CartSnapshot`] shape `{ items, total }`; restoring from a snapshot
//! re-validates line uniqueness and recomputes the total.
//!
//! # Example
//!
//! ```rust
//! use shesha_core::{Cart, NewLineItem, Price, ProductId};
//!
//! let mut cart = Cart::new();
//! let vase = cart.add_item(NewLineItem {
//!     product_id: ProductId::new("p1"),
//!     name: "Vase".to_string(),
//!     price: Price::from_units(25),
//!     image: "i1".to_string(),
//! });
//! cart.update_quantity(&vase, 3);
//! assert_eq!(cart.total(), Price::from_units(75));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{LineItemId, Price, ProductId, Quantity};

/// Candidate for [`Cart::add_item`]: a snapshot of the product's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
}

/// One product entry in the cart plus its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub quantity: Quantity,
}

impl LineItem {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Serialized form of a cart: `{ "items": [...], "total": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,
    pub total: Price,
}

/// Errors restoring a cart from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("duplicate line item id: {0}")]
    DuplicateLineId(LineItemId),
    #[error("duplicate product in cart: {0}")]
    DuplicateProduct(ProductId),
}

/// The cart: line items in insertion order and their derived total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CartSnapshot")]
pub struct Cart {
    items: Vec<LineItem>,
    total: Price,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Derived total of all lines.
    ///
    /// Line and cart sums saturate at [`rust_decimal::Decimal::MAX`], so
    /// `total == Σ price × quantity` only holds while that sum is
    /// representable.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity.get()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by id.
    #[must_use]
    pub fn get(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Add one unit of a product.
    ///
    /// If the product already has a line, its quantity goes up by one and the
    /// candidate's name, price and image are discarded: the first snapshot
    /// wins. Otherwise a new line with quantity 1 is appended.
    ///
    /// Returns the id of the line holding the product.
    pub fn add_item(&mut self, candidate: NewLineItem) -> LineItemId {
        let id = if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == candidate.product_id)
        {
            existing.quantity = existing.quantity.increment();
            existing.id.clone()
        } else {
            let id = self.fresh_id();
            self.items.push(LineItem {
                id: id.clone(),
                product_id: candidate.product_id,
                name: candidate.name,
                price: candidate.price,
                image: candidate.image,
                quantity: Quantity::ONE,
            });
            id
        };

        self.recompute_total();
        id
    }

    /// Remove a line. Unknown ids are ignored.
    ///
    /// Returns whether a line was removed.
    pub fn remove_item(&mut self, id: &LineItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.recompute_total();
        self.items.len() != before
    }

    /// Set a line's quantity.
    ///
    /// Quantities below one leave the cart unchanged; dropping a line goes
    /// through [`Cart::remove_item`]. Unknown ids are ignored.
    ///
    /// Returns whether a line was updated.
    pub fn update_quantity(&mut self, id: &LineItemId, quantity: i64) -> bool {
        let Some(quantity) = Quantity::from_requested(quantity) else {
            return false;
        };

        let updated = match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        };

        self.recompute_total();
        updated
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Price::ZERO;
    }

    /// The serialized form of this cart.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total: self.total,
        }
    }

    fn recompute_total(&mut self) {
        self.total = self.items.iter().map(LineItem::line_total).sum();
    }

    fn fresh_id(&self) -> LineItemId {
        loop {
            let id = LineItemId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

impl TryFrom<CartSnapshot> for Cart {
    type Error = SnapshotError;

    fn try_from(snapshot: CartSnapshot) -> Result<Self, Self::Error> {
        let mut ids = HashSet::new();
        let mut products = HashSet::new();
        for item in &snapshot.items {
            if !ids.insert(&item.id) {
                return Err(SnapshotError::DuplicateLineId(item.id.clone()));
            }
            if !products.insert(&item.product_id) {
                return Err(SnapshotError::DuplicateProduct(item.product_id.clone()));
            }
        }

        // The stored total is derived data; trust the lines.
        let mut cart = Self {
            items: snapshot.items,
            total: Price::ZERO,
        };
        cart.recompute_total();
        Ok(cart)
    }
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self {
            items: cart.items,
            total: cart.total,
        }
    }
}
