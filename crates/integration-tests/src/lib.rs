//! Integration tests for Shesha.
//!
//! Drives the full storefront router in-process with `tower::ServiceExt`,
//! against an in-memory `SQLite` session store and fake collaborators.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shesha-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use shesha_core::{Category, CategoryId, CurrencyCode, Price, Product, ProductFilter, ProductId};
use shesha_storefront::config::{
    CloudinaryConfig, FirebaseConfig, LogFormat, StorefrontConfig, StripeConfig,
};
use shesha_storefront::middleware::migrate_session_store;
use shesha_storefront::middleware::session::SESSION_COOKIE_NAME;
use shesha_storefront::services::{
    Catalog, CatalogEditor, CatalogError, CategoryDraft, CheckoutRequest, CheckoutSession,
    Identity, IdentityError, IdentityProvider, ImageError, ImageStore, ImageUpload,
    PaymentError, PaymentGateway, PaymentStatus, ProductDraft,
};
use shesha_storefront::state::{AppState, Services};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use tower_sessions::Session;
use tower_sessions::session::Id;
use tower_sessions_sqlx_store::SqliteStore;

// =============================================================================
// Fixtures
// =============================================================================

/// Storefront configuration for tests.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://shop.test".to_string(),
        log_format: LogFormat::Text,
        admin_role: "admin".to_string(),
        firebase: FirebaseConfig {
            project_id: "shop-shesha".to_string(),
            api_key: SecretString::from("test-firebase-key"),
        },
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_integration"),
            publishable_key: None,
            currency: CurrencyCode::USD,
        },
        cloudinary: CloudinaryConfig {
            cloud_name: "shesha".to_string(),
            upload_preset: "products".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Build a catalog product.
#[must_use]
pub fn product(id: &str, name: &str, price: Price, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("{name} from the test catalog"),
        price,
        stock: 5,
        category: category.to_string(),
        cover_image: None,
        images: vec![format!(
            "https://res.cloudinary.com/shesha/image/upload/v1/{id}.jpg"
        )],
        featured: false,
        created_at: None,
        updated_at: None,
    }
}

/// The default test catalog: a vase and a lamp.
#[must_use]
pub fn default_products() -> Vec<Product> {
    let mut vase = product("vase-01", "Blue Vase", Price::from_units(25), "decor");
    vase.featured = true;
    let lamp = product("lamp-01", "Desk Lamp", Price::from_units(65), "lighting");
    vec![vase, lamp]
}

// =============================================================================
// Fake collaborators
// =============================================================================

/// In-memory catalog, editable through `CatalogEditor`.
pub struct FakeCatalog {
    products: Mutex<Vec<Product>>,
    categories: Mutex<Vec<Category>>,
    hero: Mutex<Option<String>>,
    tokens: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl FakeCatalog {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let categories = vec![
            Category {
                id: CategoryId::new("c1"),
                name: "Decor".to_string(),
                slug: "decor".to_string(),
                image_url: None,
            },
            Category {
                id: CategoryId::new("c2"),
                name: "Lighting".to_string(),
                slug: "lighting".to_string(),
                image_url: None,
            },
        ];
        Self {
            products: Mutex::new(products),
            categories: Mutex::new(categories),
            hero: Mutex::new(Some(
                "https://res.cloudinary.com/shesha/image/upload/v1/hero.jpg".to_string(),
            )),
            tokens: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every call fail with an upstream error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current products.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    /// Current categories.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.categories.lock().unwrap().clone()
    }

    /// Tokens presented with each write, in order.
    #[must_use]
    pub fn write_tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), CatalogError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Api {
                status: 503,
                message: "catalog unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn authorize(&self, token: &SecretString) -> Result<(), CatalogError> {
        self.check()?;
        self.tokens
            .lock()
            .unwrap()
            .push(token.expose_secret().to_string());
        Ok(())
    }
}

fn product_from_draft(id: &ProductId, draft: &ProductDraft) -> Product {
    Product {
        id: id.clone(),
        name: draft.name.clone(),
        description: draft.description.clone(),
        price: draft.price,
        stock: draft.stock,
        category: draft.category.clone(),
        cover_image: Some(draft.cover_image.clone()),
        images: draft.images.clone(),
        featured: draft.featured,
        created_at: None,
        updated_at: None,
    }
}

fn category_from_draft(id: CategoryId, draft: &CategoryDraft) -> Category {
    Category {
        id,
        name: draft.name.clone(),
        slug: draft.slug.clone(),
        image_url: Some(draft.image_url.clone()),
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        self.check()?;
        let limit = filter
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(self
            .products()
            .into_iter()
            .filter(|p| filter.matches(p))
            .take(limit)
            .collect())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        self.check()?;
        Ok(self.products().into_iter().find(|p| &p.id == id))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.check()?;
        Ok(self.categories())
    }

    async fn hero_image(&self) -> Result<Option<String>, CatalogError> {
        self.check()?;
        Ok(self.hero.lock().unwrap().clone())
    }
}

#[async_trait]
impl CatalogEditor for FakeCatalog {
    async fn create_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), CatalogError> {
        self.authorize(token)?;
        let mut products = self.products.lock().unwrap();
        if products.iter().any(|p| &p.id == id) {
            return Err(CatalogError::Api {
                status: 409,
                message: format!("product {id} already exists"),
            });
        }
        products.push(product_from_draft(id, draft));
        Ok(())
    }

    async fn update_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), CatalogError> {
        self.authorize(token)?;
        let mut products = self.products.lock().unwrap();
        let existing = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        *existing = product_from_draft(id, draft);
        Ok(())
    }

    async fn delete_product(&self, token: &SecretString, id: &ProductId) -> Result<(), CatalogError> {
        self.authorize(token)?;
        self.products.lock().unwrap().retain(|p| &p.id != id);
        Ok(())
    }

    async fn create_category(
        &self,
        token: &SecretString,
        draft: &CategoryDraft,
    ) -> Result<CategoryId, CatalogError> {
        self.authorize(token)?;
        let mut categories = self.categories.lock().unwrap();
        let id = CategoryId::new(format!("c{}", categories.len() + 1));
        categories.push(category_from_draft(id.clone(), draft));
        Ok(id)
    }

    async fn update_category(
        &self,
        token: &SecretString,
        id: &CategoryId,
        draft: &CategoryDraft,
    ) -> Result<(), CatalogError> {
        self.authorize(token)?;
        let mut categories = self.categories.lock().unwrap();
        let existing = categories
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        *existing = category_from_draft(id.clone(), draft);
        Ok(())
    }

    async fn delete_category(&self, token: &SecretString, id: &CategoryId) -> Result<(), CatalogError> {
        self.authorize(token)?;
        self.categories.lock().unwrap().retain(|c| &c.id != id);
        Ok(())
    }

    async fn set_hero_image(&self, token: &SecretString, url: &str) -> Result<(), CatalogError> {
        self.authorize(token)?;
        *self.hero.lock().unwrap() = Some(url.to_string());
        Ok(())
    }
}

/// Payment gateway that records requests.
pub struct FakeGateway {
    failing: AtomicBool,
    status: Mutex<PaymentStatus>,
    requests: Mutex<Vec<CheckoutRequest>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            failing: AtomicBool::new(false),
            status: Mutex::new(PaymentStatus::Paid),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGateway {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_status(&self, status: PaymentStatus) {
        *self.status.lock().unwrap() = status;
    }

    /// Checkout requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentError::Api {
                status: 500,
                message: "gateway down".to_string(),
            });
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: "https://checkout.stripe.test/c/pay/cs_test_1".to_string(),
        })
    }

    async fn session_status(&self, _session_id: &str) -> Result<PaymentStatus, PaymentError> {
        Ok(*self.status.lock().unwrap())
    }
}

/// Image store that hands back a CDN-looking URL.
#[derive(Default)]
pub struct FakeImages;

#[async_trait]
impl ImageStore for FakeImages {
    async fn upload(&self, image: ImageUpload) -> Result<String, ImageError> {
        if image.bytes.is_empty() {
            return Err(ImageError::Invalid("empty file".to_string()));
        }
        Ok(format!(
            "https://res.cloudinary.com/shesha/image/upload/v1/{}",
            image.file_name
        ))
    }
}

/// Identity provider with a fixed set of accounts.
pub struct FakeIdentity {
    accounts: HashMap<String, (String, Vec<String>)>,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(
            "admin@shop.test".to_string(),
            ("correct-horse".to_string(), vec!["admin".to_string()]),
        );
        accounts.insert(
            "buyer@shop.test".to_string(),
            ("battery-staple".to_string(), Vec::new()),
        );
        Self { accounts }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        match self.accounts.get(email) {
            Some((expected, roles)) if expected == password => Ok(Identity {
                uid: format!("uid-{email}"),
                email: email.to_string(),
                roles: roles.clone(),
                id_token: SecretString::from(format!("token-{email}")),
            }),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A simplified HTTP response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }

    /// Value of a response header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// One browser talking to one storefront instance.
pub struct TestContext {
    pub app: Router,
    pub pool: SqlitePool,
    pub catalog: Arc<FakeCatalog>,
    pub gateway: Arc<FakeGateway>,
    session_cookie: Option<String>,
}

impl TestContext {
    /// Storefront with the default catalog.
    pub async fn new() -> Self {
        Self::with_products(default_products()).await
    }

    /// Storefront with the given catalog.
    pub async fn with_products(products: Vec<Product>) -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate_session_store(&pool).await.unwrap();

        let catalog = Arc::new(FakeCatalog::new(products));
        let gateway = Arc::new(FakeGateway::default());
        let services = Services {
            catalog: catalog.clone(),
            editor: catalog.clone(),
            payments: gateway.clone(),
            images: Arc::new(FakeImages),
            identity: Arc::new(FakeIdentity::default()),
        };
        let state = AppState::with_services(test_config(), pool.clone(), services);

        Self {
            app: shesha_storefront::app(state),
            pool,
            catalog,
            gateway,
            session_cookie: None,
        }
    }

    /// A second browser on the same storefront, without a session yet.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            app: self.app.clone(),
            pool: self.pool.clone(),
            catalog: self.catalog.clone(),
            gateway: self.gateway.clone(),
            session_cookie: None,
        }
    }

    /// Send a request, carrying and updating the session cookie.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.session_cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            if let Some(pair) = value.split(';').next()
                && pair.starts_with(&format!("{SESSION_COOKIE_NAME}="))
            {
                self.session_cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST an urlencoded form.
    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        let request = self.form_request(uri, form);
        self.send(request).await
    }

    /// An urlencoded form POST carrying the current session cookie, for
    /// driving `app` directly (e.g. several requests in flight at once).
    #[must_use]
    pub fn form_request(&self, uri: &str, form: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(form.to_string())).unwrap()
    }

    /// POST a multipart body with a single file field.
    pub async fn post_file(
        &mut self,
        uri: &str,
        field: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let boundary = "shesha-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// The cart as served by `/api/cart`.
    pub async fn cart(&mut self) -> serde_json::Value {
        let response = self.get("/api/cart").await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()
    }

    /// Sign in through the login form.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/auth/login",
            &format!("email={email}&password={password}"),
        )
        .await
    }

    /// Overwrite the stored cart snapshot for the current session.
    pub async fn corrupt_cart(&self, value: serde_json::Value) {
        let cookie = self.session_cookie.as_ref().unwrap();
        let id = cookie.split_once('=').unwrap().1;
        let store = Arc::new(SqliteStore::new(self.pool.clone()));
        let session = Session::new(Some(Id::from_str(id).unwrap()), store, None);
        session
            .insert_value(shesha_storefront::cart_store::CART_STORAGE_KEY, value)
            .await
            .unwrap();
        session.save().await.unwrap();
    }
}
