//! Collaborator contracts for the storefront.
//!
//! Everything the storefront does not own lives behind one of these traits:
//!
//! - [`Catalog`] - product/category lookup (Firestore)
//! - [`CatalogEditor`] - admin writes to the same catalog (Firestore)
//! - [`PaymentGateway`] - hosted checkout sessions (Stripe)
//! - [`ImageStore`] - binary image upload (Cloudinary)
//! - [`IdentityProvider`] - password sign-in yielding a caller identity (Firebase Auth)
//!
//! Handlers reach them through [`crate::state::AppState`] as `Arc<dyn Trait>`,
//! so tests can swap in fakes.

pub mod catalog;
pub mod identity;
pub mod images;
pub mod payments;

pub use catalog::{Catalog, CatalogEditor, CatalogError, CategoryDraft, ProductDraft};
pub use identity::{Identity, IdentityError, IdentityProvider};
pub use images::{ImageError, ImageStore, ImageUpload};
pub use payments::{
    CheckoutLine, CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway, PaymentStatus,
};
