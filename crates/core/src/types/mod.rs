//! Core types for Shesha.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod id;
pub mod price;
pub mod quantity;
pub mod slug;

pub use catalog::{Category, Product, ProductFilter};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use quantity::Quantity;
pub use slug::{slugify, timestamped_slug};
