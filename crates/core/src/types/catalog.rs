//! Catalog entries as read from the hosted document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;
use crate::cart::NewLineItem;

/// A product listed in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Units on hand, informational only.
    pub stock: u32,
    /// Slug of the category this product belongs to.
    pub category: String,
    /// Image shown on listing cards, when set separately from the gallery.
    pub cover_image: Option<String>,
    /// Gallery images, in display order.
    pub images: Vec<String>,
    pub featured: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Image for listing cards: the cover image, else the first gallery image.
    #[must_use]
    pub fn display_image(&self) -> Option<&str> {
        self.cover_image
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| self.images.first().map(String::as_str))
    }

    /// Build the cart candidate for this product.
    ///
    /// The line image is the first gallery image, falling back to the cover.
    #[must_use]
    pub fn to_line_candidate(&self) -> NewLineItem {
        let image = self
            .images
            .first()
            .cloned()
            .or_else(|| self.cover_image.clone())
            .unwrap_or_default();

        NewLineItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            image,
        }
    }

    /// Whether any units are on hand.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
}

/// Predicate for catalog listings. Empty means "all products".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<u32>,
}

impl ProductFilter {
    /// Match every product.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Products in a category (by slug).
    #[must_use]
    pub fn in_category(slug: impl Into<String>) -> Self {
        Self {
            category: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Featured products only.
    #[must_use]
    pub fn featured() -> Self {
        Self {
            featured: Some(true),
            ..Self::default()
        }
    }

    /// Cap the number of results.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `product` satisfies this filter (ignoring `limit`).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category
            .as_ref()
            .is_none_or(|category| &product.category == category)
            && self.featured.is_none_or(|featured| product.featured == featured)
    }
}
