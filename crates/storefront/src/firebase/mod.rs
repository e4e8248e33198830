//! Firebase clients: Firestore (catalog) and Identity Toolkit (sign-in).
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`; the Web API key travels in the
//!   `x-goog-api-key` header
//! - Firestore is source of truth for products, categories and settings -
//!   NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//!
//! # Collections
//!
//! - `products` - one document per product, queried by `category` / `featured`
//! - `categories` - one document per category
//! - `settings/hero` - home page hero image (`imageUrl`)

mod auth;
mod cache;
mod firestore;
pub mod values;

pub use auth::FirebaseIdentity;
pub use firestore::FirestoreCatalog;

/// Header carrying the Firebase Web API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Truncate a response body for logs and error messages.
fn truncate_body(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
