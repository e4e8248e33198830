//! Firestore REST catalog client.
//!
//! Caches products, categories and the hero image using `moka` (5-minute TTL).
//! Admin writes authenticate with the signed-in admin's ID token and clear the
//! whole cache on success.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use shesha_core::{Category, CategoryId, Product, ProductFilter, ProductId};
use tracing::{debug, instrument, warn};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::values::{
    CATEGORY_FIELD_PATHS, Document, Fields, PRODUCT_FIELD_PATHS, RunQueryResponse,
    category_fields, category_from_document, hero_fields, product_fields,
    product_from_document, with_created_at,
};
use super::{API_KEY_HEADER, truncate_body};
use crate::config::FirebaseConfig;
use crate::services::{Catalog, CatalogEditor, CatalogError, CategoryDraft, ProductDraft};

/// Firestore REST API base URL.
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

const PRODUCTS: &str = "products";
const CATEGORIES: &str = "categories";
const SETTINGS: &str = "settings";
const HERO_DOCUMENT: &str = "hero";

/// Client for the catalog stored in Firestore.
#[derive(Clone)]
pub struct FirestoreCatalog {
    inner: Arc<FirestoreCatalogInner>,
}

struct FirestoreCatalogInner {
    client: reqwest::Client,
    documents_url: String,
    api_key: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl FirestoreCatalog {
    /// Create a new Firestore catalog client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let documents_url = format!(
            "{FIRESTORE_BASE_URL}/projects/{}/databases/(default)/documents",
            config.project_id
        );

        Self {
            inner: Arc::new(FirestoreCatalogInner {
                client: reqwest::Client::new(),
                documents_url,
                api_key: config.api_key.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Run a structured query against a top-level collection.
    async fn run_query(
        &self,
        collection: &str,
        filter: &ProductFilter,
    ) -> Result<Vec<Document>, CatalogError> {
        let url = format!("{}:runQuery", self.inner.documents_url);
        let body = structured_query(collection, filter);

        let response = self
            .inner
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.inner.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                collection,
                body = %truncate_body(&response_text, 500),
                "Firestore query returned non-success status"
            );
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: truncate_body(&response_text, 200),
            });
        }

        let results: Vec<RunQueryResponse> = serde_json::from_str(&response_text)?;
        Ok(results.into_iter().filter_map(|r| r.document).collect())
    }

    /// Fetch a single document, `None` on 404.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, CatalogError> {
        let url = format!(
            "{}/{collection}/{}",
            self.inner.documents_url,
            urlencoding::encode(id)
        );

        let response = self
            .inner
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.inner.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response_text = response.text().await?;
        if !status.is_success() {
            tracing::error!(
                status = %status,
                collection,
                id,
                body = %truncate_body(&response_text, 500),
                "Firestore get returned non-success status"
            );
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: truncate_body(&response_text, 200),
            });
        }

        Ok(Some(serde_json::from_str(&response_text)?))
    }

    /// URL of `{collection}/{id}` (or the collection itself) with query pairs.
    fn document_url(
        &self,
        collection: &str,
        id: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<Url, CatalogError> {
        let mut raw = format!("{}/{collection}", self.inner.documents_url);
        if let Some(id) = id {
            raw.push('/');
            raw.push_str(&urlencoding::encode(id));
        }
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| CatalogError::Api {
            status: 0,
            message: format!("invalid document URL: {e}"),
        })
    }

    /// Send an authenticated write and return the resulting document, if
    /// the response carries one.
    async fn write(
        &self,
        method: Method,
        url: Url,
        token: &SecretString,
        fields: Option<Fields>,
    ) -> Result<Option<Document>, CatalogError> {
        let mut request = self
            .inner
            .client
            .request(method.clone(), url)
            .header(API_KEY_HEADER, &self.inner.api_key)
            .bearer_auth(token.expose_secret());
        if let Some(fields) = fields {
            request = request.json(&json!({ "fields": fields }));
        }

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(write_error(&method, status, &response_text));
        }

        self.inner.cache.invalidate_all();

        if response_text.trim().is_empty() || method == Method::DELETE {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&response_text)?))
    }
}

/// Map a failed write response.
fn write_error(method: &Method, status: StatusCode, body: &str) -> CatalogError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!(%method, status = %status, "Firestore rejected write credentials");
            CatalogError::Denied {
                status: status.as_u16(),
            }
        }
        // Precondition `exists=true` failing reports NOT_FOUND.
        StatusCode::NOT_FOUND => CatalogError::NotFound(truncate_body(body, 200)),
        _ => {
            tracing::error!(
                %method,
                status = %status,
                body = %truncate_body(body, 500),
                "Firestore write returned non-success status"
            );
            CatalogError::Api {
                status: status.as_u16(),
                message: truncate_body(body, 200),
            }
        }
    }
}

/// Query pairs for a masked update of an existing document.
fn update_params<'a>(paths: &[&'a str]) -> Vec<(&'a str, &'a str)> {
    let mut params = vec![("currentDocument.exists", "true")];
    params.extend(paths.iter().map(|path| ("updateMask.fieldPaths", *path)));
    params
}

/// Build a `runQuery` body for `collection`.
///
/// `category` and `featured` become EQUAL field filters (AND-ed when both are
/// set); `limit` is passed through.
fn structured_query(collection: &str, filter: &ProductFilter) -> serde_json::Value {
    let mut field_filters = Vec::new();
    if let Some(category) = &filter.category {
        field_filters.push(json!({
            "fieldFilter": {
                "field": { "fieldPath": "category" },
                "op": "EQUAL",
                "value": { "stringValue": category }
            }
        }));
    }
    if let Some(featured) = filter.featured {
        field_filters.push(json!({
            "fieldFilter": {
                "field": { "fieldPath": "featured" },
                "op": "EQUAL",
                "value": { "booleanValue": featured }
            }
        }));
    }

    let mut query = json!({ "from": [{ "collectionId": collection }] });
    let where_clause = match field_filters.len() {
        0 => None,
        1 => field_filters.pop(),
        _ => Some(json!({
            "compositeFilter": { "op": "AND", "filters": field_filters }
        })),
    };
    if let Some(clause) = where_clause {
        query["where"] = clause;
    }
    if let Some(limit) = filter.limit {
        query["limit"] = json!(limit);
    }

    json!({ "structuredQuery": query })
}

/// Decode every document, skipping (and logging) the malformed ones.
fn decode_all<T>(
    documents: &[Document],
    decode: impl Fn(&Document) -> Result<T, CatalogError>,
) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match decode(doc) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(document = %doc.name, error = %e, "Skipping malformed catalog document");
                None
            }
        })
        .collect()
}

#[async_trait]
impl Catalog for FirestoreCatalog {
    #[instrument(skip(self))]
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        let cache_key = CacheKey::Products(filter.clone());

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let documents = self.run_query(PRODUCTS, filter).await?;
        let products = decode_all(&documents, product_from_document);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product.map(|p| *p));
        }

        let product = match self.get_document(PRODUCTS, id.as_str()).await? {
            Some(doc) => Some(product_from_document(&doc)?),
            None => None,
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(product.clone().map(Box::new)))
            .await;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let documents = self.run_query(CATEGORIES, &ProductFilter::all()).await?;
        let categories = decode_all(&documents, category_from_document);

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn hero_image(&self) -> Result<Option<String>, CatalogError> {
        if let Some(CacheValue::Hero(hero)) = self.inner.cache.get(&CacheKey::Hero).await {
            return Ok(hero);
        }

        let hero = self
            .get_document(SETTINGS, HERO_DOCUMENT)
            .await?
            .and_then(|doc| doc.string("imageUrl").map(str::to_string))
            .filter(|url| !url.is_empty());

        self.inner
            .cache
            .insert(CacheKey::Hero, CacheValue::Hero(hero.clone()))
            .await;

        Ok(hero)
    }
}

#[async_trait]
impl CatalogEditor for FirestoreCatalog {
    #[instrument(skip(self, token, draft), fields(id = %id))]
    async fn create_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), CatalogError> {
        let now = Utc::now();
        let fields = with_created_at(product_fields(draft, now)?, now);
        let url = self.document_url(
            PRODUCTS,
            Some(id.as_str()),
            &[("currentDocument.exists", "false")],
        )?;

        self.write(Method::PATCH, url, token, Some(fields)).await?;
        tracing::info!("Product created");
        Ok(())
    }

    #[instrument(skip(self, token, draft), fields(id = %id))]
    async fn update_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), CatalogError> {
        let fields = product_fields(draft, Utc::now())?;
        let url = self.document_url(
            PRODUCTS,
            Some(id.as_str()),
            &update_params(&PRODUCT_FIELD_PATHS),
        )?;

        self.write(Method::PATCH, url, token, Some(fields)).await?;
        tracing::info!("Product updated");
        Ok(())
    }

    #[instrument(skip(self, token), fields(id = %id))]
    async fn delete_product(
        &self,
        token: &SecretString,
        id: &ProductId,
    ) -> Result<(), CatalogError> {
        let url = self.document_url(PRODUCTS, Some(id.as_str()), &[])?;
        self.write(Method::DELETE, url, token, None).await?;
        tracing::info!("Product deleted");
        Ok(())
    }

    #[instrument(skip(self, token, draft), fields(slug = %draft.slug))]
    async fn create_category(
        &self,
        token: &SecretString,
        draft: &CategoryDraft,
    ) -> Result<CategoryId, CatalogError> {
        let url = self.document_url(CATEGORIES, None, &[])?;
        let document = self
            .write(Method::POST, url, token, Some(category_fields(draft)))
            .await?
            .ok_or_else(|| CatalogError::Decode {
                document: CATEGORIES.to_string(),
                reason: "create returned no document".to_string(),
            })?;

        let id = CategoryId::new(document.id());
        tracing::info!(id = %id, "Category created");
        Ok(id)
    }

    #[instrument(skip(self, token, draft), fields(id = %id))]
    async fn update_category(
        &self,
        token: &SecretString,
        id: &CategoryId,
        draft: &CategoryDraft,
    ) -> Result<(), CatalogError> {
        let url = self.document_url(
            CATEGORIES,
            Some(id.as_str()),
            &update_params(&CATEGORY_FIELD_PATHS),
        )?;
        self.write(Method::PATCH, url, token, Some(category_fields(draft)))
            .await?;
        tracing::info!("Category updated");
        Ok(())
    }

    #[instrument(skip(self, token), fields(id = %id))]
    async fn delete_category(
        &self,
        token: &SecretString,
        id: &CategoryId,
    ) -> Result<(), CatalogError> {
        let url = self.document_url(CATEGORIES, Some(id.as_str()), &[])?;
        self.write(Method::DELETE, url, token, None).await?;
        tracing::info!("Category deleted");
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn set_hero_image(&self, token: &SecretString, url: &str) -> Result<(), CatalogError> {
        // No mask: the settings document is replaced wholesale.
        let document_url = self.document_url(SETTINGS, Some(HERO_DOCUMENT), &[])?;
        self.write(
            Method::PATCH,
            document_url,
            token,
            Some(hero_fields(url, Utc::now())),
        )
        .await?;
        tracing::info!("Hero image updated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_query_without_filters() {
        let body = structured_query(PRODUCTS, &ProductFilter::all());
        assert_eq!(
            body,
            json!({ "structuredQuery": { "from": [{ "collectionId": "products" }] } })
        );
    }

    #[test]
    fn test_structured_query_single_filter() {
        let body = structured_query(PRODUCTS, &ProductFilter::in_category("decor"));
        assert_eq!(
            body["structuredQuery"]["where"]["fieldFilter"]["value"]["stringValue"],
            "decor"
        );
    }

    #[test]
    fn test_structured_query_composite_filter_and_limit() {
        let filter = ProductFilter {
            category: Some("decor".to_string()),
            featured: Some(true),
            limit: Some(8),
        };
        let body = structured_query(PRODUCTS, &filter);
        let query = &body["structuredQuery"];

        assert_eq!(query["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(
            query["where"]["compositeFilter"]["filters"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
        assert_eq!(query["limit"], 8);
    }

    #[test]
    fn test_update_params_mask_every_field() {
        let params = update_params(&CATEGORY_FIELD_PATHS);
        assert_eq!(
            params,
            vec![
                ("currentDocument.exists", "true"),
                ("updateMask.fieldPaths", "name"),
                ("updateMask.fieldPaths", "slug"),
                ("updateMask.fieldPaths", "imageUrl"),
            ]
        );
    }

    #[test]
    fn test_document_url_encodes_id_and_params() {
        let catalog = FirestoreCatalog::new(&FirebaseConfig {
            project_id: "shop".to_string(),
            api_key: SecretString::from("key"),
        });
        let url = catalog
            .document_url(PRODUCTS, Some("a b"), &[("currentDocument.exists", "false")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/shop/databases/(default)/documents/products/a%20b?currentDocument.exists=false"
        );
    }

    #[test]
    fn test_write_error_mapping() {
        assert!(matches!(
            write_error(&Method::PATCH, StatusCode::FORBIDDEN, "{}"),
            CatalogError::Denied { status: 403 }
        ));
        assert!(matches!(
            write_error(&Method::PATCH, StatusCode::NOT_FOUND, "{}"),
            CatalogError::NotFound(_)
        ));
        assert!(matches!(
            write_error(&Method::DELETE, StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            CatalogError::Api { status: 500, .. }
        ));
    }
}
