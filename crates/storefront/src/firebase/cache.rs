//! Cache types for Firestore catalog responses.

use shesha_core::{Category, Product, ProductFilter, ProductId};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductFilter),
    Categories,
    Hero,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Option<Box<Product>>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Hero(Option<String>),
}
