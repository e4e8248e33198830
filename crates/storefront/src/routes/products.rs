//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shesha_core::{Category, CurrencyCode, Product, ProductFilter, ProductId, media};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product card thumbnail size.
const CARD_WIDTH: u32 = 400;
const CARD_HEIGHT: u32 = 300;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub in_stock: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.format(currency),
            image: product
                .display_image()
                .map(|url| media::derive_url(url, CARD_WIDTH, CARD_HEIGHT)),
            in_stock: product.in_stock(),
        }
    }
}

/// Category display data for templates.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub active: bool,
}

impl CategoryView {
    #[must_use]
    pub fn new(category: &Category, active: Option<&str>) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            image: category
                .image_url
                .as_deref()
                .map(|url| media::derive_url(url, CARD_WIDTH, CARD_HEIGHT)),
            active: active == Some(category.slug.as_str()),
        }
    }
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: u32,
    pub in_stock: bool,
    pub category: String,
    pub images: Vec<String>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let mut images = Vec::new();
        if let Some(cover) = product.display_image() {
            images.push(cover.to_string());
        }
        for url in &product.images {
            if !url.is_empty() && !images.contains(url) {
                images.push(url.clone());
            }
        }

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.format(currency),
            stock: product.stock,
            in_stock: product.in_stock(),
            category: product.category.clone(),
            images,
        }
    }
}

/// Product listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryView>,
    pub heading: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Display product listing page, optionally filtered by category slug.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<ProductsIndexTemplate> {
    let category = query.category.filter(|slug| !slug.is_empty());
    let filter = category
        .as_deref()
        .map_or_else(ProductFilter::all, ProductFilter::in_category);

    let products = state.catalog().list_products(&filter).await?;
    let categories = state.catalog().list_categories().await?;
    let currency = state.config().stripe.currency;

    let heading = category
        .as_deref()
        .and_then(|slug| categories.iter().find(|c| c.slug == slug))
        .map_or_else(|| "All products".to_string(), |c| c.name.clone());

    Ok(ProductsIndexTemplate {
        products: products
            .iter()
            .map(|p| ProductCardView::new(p, currency))
            .collect(),
        categories: categories
            .iter()
            .map(|c| CategoryView::new(c, category.as_deref()))
            .collect(),
        heading,
    })
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state
        .catalog()
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductShowTemplate {
        product: ProductView::new(&product, state.config().stripe.currency),
    })
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use shesha_core::Price;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("vase-01"),
            name: "Blue Vase".to_string(),
            description: String::new(),
            price: Price::from_units(25),
            stock: 0,
            category: "decor".to_string(),
            cover_image: Some("https://res.cloudinary.com/s/image/upload/v1/cover.jpg".to_string()),
            images: vec![
                "https://res.cloudinary.com/s/image/upload/v1/cover.jpg".to_string(),
                "https://res.cloudinary.com/s/image/upload/v1/side.jpg".to_string(),
            ],
            featured: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_card_view_uses_thumbnail() {
        let card = ProductCardView::new(&product(), CurrencyCode::USD);
        assert_eq!(card.price, "$25.00");
        assert!(!card.in_stock);
        assert_eq!(
            card.image.as_deref(),
            Some("https://res.cloudinary.com/s/image/upload/c_fill,w_400,h_300/v1/cover.jpg")
        );
    }

    #[test]
    fn test_detail_view_dedups_images() {
        let view = ProductView::new(&product(), CurrencyCode::USD);
        assert_eq!(view.images.len(), 2);
        assert!(view.images[0].ends_with("cover.jpg"));
    }
}
