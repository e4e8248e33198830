//! Admin route handlers.
//!
//! Catalog dashboard, product and category editing, the home page hero image
//! and image uploads. Every handler requires the admin role; writes go to the
//! catalog with the admin's own provider token.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shesha_core::{Category, CategoryId, Price, Product, ProductFilter, ProductId, media, slugify, timestamped_slug};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::services::{CategoryDraft, ImageUpload, ProductDraft};
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Dashboard thumbnail size.
const THUMB_WIDTH: u32 = 400;
const THUMB_HEIGHT: u32 = 300;

/// Product row display data for the dashboard.
#[derive(Clone)]
pub struct AdminProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub stock: u32,
    pub category: String,
    pub featured: bool,
    pub thumbnail: Option<String>,
}

/// Category row display data for the dashboard and product form.
#[derive(Clone)]
pub struct AdminCategoryView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image_url: String,
    pub thumbnail: Option<String>,
}

impl AdminCategoryView {
    fn new(category: &Category) -> Self {
        let image_url = category.image_url.clone().unwrap_or_default();
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            thumbnail: Some(image_url.as_str())
                .filter(|url| !url.is_empty())
                .map(|url| media::derive_url(url, THUMB_WIDTH, THUMB_HEIGHT)),
            image_url,
        }
    }
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub email: String,
    pub hero_image: Option<String>,
    pub products: Vec<AdminProductView>,
    pub categories: Vec<AdminCategoryView>,
}

/// Product create/edit form.
///
/// Every field arrives as text so a bad value can be shown back to the
/// admin. `images` holds one URL per line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub images: String,
    /// Checkbox: present when ticked.
    pub featured: Option<String>,
}

impl ProductForm {
    /// Prefill from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            stock: product.stock.to_string(),
            category: product.category.clone(),
            cover_image: product.cover_image.clone().unwrap_or_default(),
            images: product.images.join("\n"),
            featured: product.featured.then(|| "on".to_string()),
        }
    }

    /// Validate into a draft, or return the message to show.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for the first invalid field.
    pub fn to_draft(&self) -> std::result::Result<ProductDraft, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let price: Price = self
            .price
            .parse()
            .map_err(|_| "Price must be a non-negative number".to_string())?;
        let stock: u32 = self
            .stock
            .trim()
            .parse()
            .map_err(|_| "Stock must be a whole number".to_string())?;
        let category = self.category.trim();
        if category.is_empty() {
            return Err("Choose a category".to_string());
        }
        let cover_image = self.cover_image.trim();
        if cover_image.is_empty() {
            return Err("Cover image is required".to_string());
        }

        let mut images: Vec<String> = Vec::new();
        for url in self.images.lines().map(str::trim).filter(|url| !url.is_empty()) {
            if !images.iter().any(|seen| seen == url) {
                images.push(url.to_string());
            }
        }

        Ok(ProductDraft {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            stock,
            category: category.to_string(),
            cover_image: cover_image.to_string(),
            images,
            featured: self.featured.is_some(),
        })
    }
}

/// Product create/edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub heading: String,
    pub action: String,
    pub form: ProductForm,
    pub categories: Vec<AdminCategoryView>,
    pub error: Option<String>,
}

/// Category create/edit form.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    /// Derived from the name when blank.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image_url: String,
}

impl CategoryForm {
    /// Validate into a draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when the name or image is missing.
    pub fn to_draft(&self) -> Result<CategoryDraft> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Category name is required".to_string()));
        }
        let image_url = self.image_url.trim();
        if image_url.is_empty() {
            return Err(AppError::BadRequest("Category image is required".to_string()));
        }
        let slug = match slugify(&self.slug) {
            s if s.is_empty() => slugify(name),
            s => s,
        };
        Ok(CategoryDraft {
            name: name.to_string(),
            slug,
            image_url: image_url.to_string(),
        })
    }
}

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub thumbnail_url: String,
}

async fn category_views(state: &AppState) -> Result<Vec<AdminCategoryView>> {
    let categories = state.catalog().list_categories().await?;
    Ok(categories.iter().map(AdminCategoryView::new).collect())
}

/// Read the `file` field of a multipart body.
async fn read_image(multipart: &mut Multipart) -> Result<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::BadRequest("missing file field".to_string()))
}

/// Display the admin dashboard.
#[instrument(skip(state, admin), fields(uid = %admin.user.uid))]
pub async fn dashboard(State(state): State<AppState>, admin: RequireAdmin) -> Result<DashboardTemplate> {
    let products = state.catalog().list_products(&ProductFilter::all()).await?;
    let hero_image = state.catalog().hero_image().await?;
    let currency = state.config().stripe.currency;

    Ok(DashboardTemplate {
        email: admin.user.email,
        hero_image: hero_image.map(|url| media::derive_url(&url, THUMB_WIDTH, THUMB_HEIGHT)),
        products: products
            .iter()
            .map(|p| AdminProductView {
                id: p.id.to_string(),
                name: p.name.clone(),
                price: p.price.format(currency),
                stock: p.stock,
                category: p.category.clone(),
                featured: p.featured,
                thumbnail: p
                    .display_image()
                    .map(|url| media::derive_url(url, THUMB_WIDTH, THUMB_HEIGHT)),
            })
            .collect(),
        categories: category_views(&state).await?,
    })
}

/// Upload an image for use in the catalog.
///
/// Expects a multipart body with a `file` field. Returns the delivery URL
/// and a 500x500 thumbnail rendition.
#[instrument(skip(state, admin, multipart), fields(uid = %admin.user.uid))]
pub async fn upload_image(
    State(state): State<AppState>,
    admin: RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let upload = read_image(&mut multipart).await?;
    let url = state.images().upload(upload).await?;
    let thumbnail_url = media::derive_url(&url, 500, 500);

    Ok(Json(UploadResponse { url, thumbnail_url }))
}

/// Blank product form.
#[instrument(skip(state, admin), fields(uid = %admin.user.uid))]
pub async fn new_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<ProductFormTemplate> {
    Ok(ProductFormTemplate {
        heading: "New product".to_string(),
        action: "/admin/products".to_string(),
        form: ProductForm::default(),
        categories: category_views(&state).await?,
        error: None,
    })
}

/// Create a product under a fresh id derived from its name.
#[instrument(skip(state, admin, form), fields(uid = %admin.user.uid))]
pub async fn create_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                ProductFormTemplate {
                    heading: "New product".to_string(),
                    action: "/admin/products".to_string(),
                    form,
                    categories: category_views(&state).await?,
                    error: Some(message),
                },
            )
                .into_response());
        }
    };

    let id = ProductId::new(timestamped_slug(&draft.name, Utc::now()));
    state
        .editor()
        .create_product(&admin.id_token, &id, &draft)
        .await?;
    add_breadcrumb("admin", "Product created", Some(&[("product_id", id.as_str())]));

    Ok(Redirect::to("/admin").into_response())
}

/// Product form prefilled from the catalog.
#[instrument(skip(state, admin), fields(uid = %admin.user.uid))]
pub async fn edit_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<ProductFormTemplate> {
    let product = state
        .catalog()
        .get_product(&ProductId::new(id.as_str()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate {
        heading: format!("Edit {}", product.name),
        action: format!("/admin/products/{id}"),
        form: ProductForm::from_product(&product),
        categories: category_views(&state).await?,
        error: None,
    })
}

/// Save changes to an existing product.
#[instrument(skip(state, admin, form), fields(uid = %admin.user.uid))]
pub async fn update_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                ProductFormTemplate {
                    heading: format!("Edit {}", form.name),
                    action: format!("/admin/products/{id}"),
                    form,
                    categories: category_views(&state).await?,
                    error: Some(message),
                },
            )
                .into_response());
        }
    };

    let id = ProductId::new(id);
    state
        .editor()
        .update_product(&admin.id_token, &id, &draft)
        .await?;
    add_breadcrumb("admin", "Product updated", Some(&[("product_id", id.as_str())]));

    Ok(Redirect::to("/admin").into_response())
}

/// Delete a product.
#[instrument(skip(state, admin), fields(uid = %admin.user.uid))]
pub async fn delete_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = ProductId::new(id);
    state.editor().delete_product(&admin.id_token, &id).await?;
    add_breadcrumb("admin", "Product deleted", Some(&[("product_id", id.as_str())]));
    Ok(Redirect::to("/admin"))
}

/// Create a category.
#[instrument(skip(state, admin, form), fields(uid = %admin.user.uid))]
pub async fn create_category(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let draft = form.to_draft()?;
    let id = state
        .editor()
        .create_category(&admin.id_token, &draft)
        .await?;
    add_breadcrumb("admin", "Category created", Some(&[("category_id", id.as_str())]));
    Ok(Redirect::to("/admin"))
}

/// Save changes to a category.
#[instrument(skip(state, admin, form), fields(uid = %admin.user.uid))]
pub async fn update_category(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let draft = form.to_draft()?;
    state
        .editor()
        .update_category(&admin.id_token, &CategoryId::new(id), &draft)
        .await?;
    Ok(Redirect::to("/admin"))
}

/// Delete a category.
#[instrument(skip(state, admin), fields(uid = %admin.user.uid))]
pub async fn delete_category(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    state
        .editor()
        .delete_category(&admin.id_token, &CategoryId::new(id))
        .await?;
    Ok(Redirect::to("/admin"))
}

/// Upload a new home page hero image and make it current.
#[instrument(skip(state, admin, multipart), fields(uid = %admin.user.uid))]
pub async fn set_hero(
    State(state): State<AppState>,
    admin: RequireAdmin,
    mut multipart: Multipart,
) -> Result<Redirect> {
    let upload = read_image(&mut multipart).await?;
    let url = state.images().upload(upload).await?;
    state.editor().set_hero_image(&admin.id_token, &url).await?;
    Ok(Redirect::to("/admin"))
}
