//! Catalog contracts: storefront lookups and admin edits.

use async_trait::async_trait;
use secrecy::SecretString;
use shesha_core::{Category, CategoryId, Price, Product, ProductFilter, ProductId};
use thiserror::Error;

/// Errors from the catalog backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A document did not have the expected shape.
    #[error("Malformed document {document}: {reason}")]
    Decode { document: String, reason: String },

    /// A value could not be written in the backend's format.
    #[error("Cannot encode {field}: {reason}")]
    Encode { field: String, reason: String },

    /// The document to change does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the caller's credentials for a write.
    #[error("Write rejected with status {status}")]
    Denied { status: u16 },
}

/// Read-only access to products, categories and site settings.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Products matching `filter`.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError>;

    /// A single product, or `None` if it does not exist.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// All categories.
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;

    /// Home page hero image, if one is configured.
    async fn hero_image(&self) -> Result<Option<String>, CatalogError>;
}

/// Product fields the admin UI edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    /// Category slug.
    pub category: String,
    pub cover_image: String,
    pub images: Vec<String>,
    pub featured: bool,
}

/// Category fields the admin UI edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub slug: String,
    pub image_url: String,
}

/// Catalog writes made from the admin UI.
///
/// Every call carries the signed-in admin's provider token; the backend's
/// own access rules decide whether the write is allowed.
#[async_trait]
pub trait CatalogEditor: Send + Sync {
    /// Create a product under `id`. Fails if the id is taken.
    async fn create_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), CatalogError>;

    /// Replace the editable fields of an existing product.
    async fn update_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), CatalogError>;

    /// Delete a product. Deleting a missing product succeeds.
    async fn delete_product(&self, token: &SecretString, id: &ProductId)
    -> Result<(), CatalogError>;

    /// Create a category, returning its generated id.
    async fn create_category(
        &self,
        token: &SecretString,
        draft: &CategoryDraft,
    ) -> Result<CategoryId, CatalogError>;

    /// Replace the fields of an existing category.
    async fn update_category(
        &self,
        token: &SecretString,
        id: &CategoryId,
        draft: &CategoryDraft,
    ) -> Result<(), CatalogError>;

    /// Delete a category. Products keep their category slug.
    async fn delete_category(
        &self,
        token: &SecretString,
        id: &CategoryId,
    ) -> Result<(), CatalogError>;

    /// Set the home page hero image.
    async fn set_hero_image(&self, token: &SecretString, url: &str) -> Result<(), CatalogError>;
}
