//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use shesha_core::{ProductFilter, media};
use tracing::instrument;

use super::products::{CategoryView, ProductCardView};
use crate::error::Result;
use crate::state::AppState;

/// Featured products shown on the home page.
const FEATURED_LIMIT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub hero_image: Option<String>,
    pub categories: Vec<CategoryView>,
    pub featured: Vec<ProductCardView>,
}

/// Display home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let catalog = state.catalog();
    let currency = state.config().stripe.currency;

    let hero_image = catalog
        .hero_image()
        .await?
        .map(|url| media::derive_url(&url, 1600, 700));
    let categories = catalog.list_categories().await?;
    let featured = catalog
        .list_products(&ProductFilter::featured().with_limit(FEATURED_LIMIT))
        .await?;

    Ok(HomeTemplate {
        hero_image,
        categories: categories
            .iter()
            .map(|c| CategoryView::new(c, None))
            .collect(),
        featured: featured
            .iter()
            .map(|p| ProductCardView::new(p, currency))
            .collect(),
    })
}
