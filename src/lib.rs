//! Menu Manager
//!
//! Back-office menu catalog for a delivery business, with staged editing.
//!
//! ## Features
//! - Product and category management
//! - Every product edit captured as a typed, deduplicated pending change
//! - Bulk stock, price, status and delete over a selection
//! - Publish into a bounded audit log, or discard back to the seed menu
//! - Durable JSON blob persistence

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod http;
pub mod persistence;
pub mod seed;
pub mod store;

pub use domain::aggregates::{Category, CategoryDraft, CategoryUpdate, Product, ProductDraft, ProductUpdate};
pub use domain::changes::{ChangeKind, ChangeValue, PendingChange, PublishLog};
pub use domain::value_objects::{Money, Quantity, Sku};
pub use store::{BulkOutcome, CatalogStore, PriceMode, StockMode};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category still has products: {0}")]
    CategoryInUse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, MenuError>;
