//! Aggregates module
pub mod product;
pub mod category;

pub use product::{Product, ProductDraft, ProductUpdate};
pub use category::{Category, CategoryDraft, CategoryUpdate};
