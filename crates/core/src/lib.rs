//! Shesha Core - Shared domain library.
//!
//! This crate provides the types and state machines used by the Shesha
//! storefront:
//! - `storefront` - Public-facing shop, cart and checkout
//! - `integration-tests` - End-to-end flows against the storefront router
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Persistence of the cart lives in the storefront as
//! a thin adapter around [`cart::Cart`].
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities and catalog entries
//! - [`cart`] - The cart state machine and its snapshot format
//! - [`media`] - CDN rendition URL derivation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod media;
pub mod types;

pub use cart::{Cart, CartSnapshot, LineItem, NewLineItem, SnapshotError};
pub use types::*;
