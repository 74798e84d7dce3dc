//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use crate::domain::value_objects::{Money, Quantity, Sku};

/// A menu catalog entry. `id` and `sku` never change after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: String,
    name: String,
    price: Money,
    description: String,
    image: String,
    category: String,
    subcategory: Option<String>,
    inventory: Quantity,
    low_stock_threshold: u32,
    sku: Sku,
    tags: BTreeSet<String>,
    active: bool,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for creating a product. The store assigns id, sku and timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    pub name: String,
    pub price: Money,
    pub description: String,
    pub image: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub inventory: u32,
    pub low_stock_threshold: u32,
    pub tags: BTreeSet<String>,
    pub active: bool,
    pub featured: bool,
}

/// Partial field update. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub inventory: Option<u32>,
    pub low_stock_threshold: Option<u32>,
    pub tags: Option<BTreeSet<String>>,
    pub active: Option<bool>,
    pub featured: Option<bool>,
}

impl ProductUpdate {
    pub fn inventory(value: u32) -> Self { Self { inventory: Some(value), ..Self::default() } }
    pub fn price(value: Money) -> Self { Self { price: Some(value), ..Self::default() } }
    pub fn active(value: bool) -> Self { Self { active: Some(value), ..Self::default() } }

    /// True when the update carries any of the "details" fields.
    pub fn touches_details(&self) -> bool {
        self.name.is_some() || self.description.is_some() || self.category.is_some()
    }
}

impl Product {
    pub fn create(sku: Sku, draft: ProductDraft, now: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::now_v7().to_string(), sku, draft, now)
    }

    pub(crate) fn with_id(id: String, sku: Sku, draft: ProductDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
            description: draft.description,
            image: draft.image,
            category: draft.category,
            subcategory: draft.subcategory,
            inventory: Quantity::new(draft.inventory),
            low_stock_threshold: draft.low_stock_threshold,
            sku,
            tags: draft.tags,
            active: draft.active,
            featured: draft.featured,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy every editable field into a new product with its own id and sku.
    pub fn duplicate(&self, sku: Sku, now: DateTime<Utc>) -> Self {
        let mut draft = self.to_draft();
        draft.name = format!("{} (Copy)", self.name);
        Self::create(sku, draft, now)
    }

    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            price: self.price,
            description: self.description.clone(),
            image: self.image.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            inventory: self.inventory.value(),
            low_stock_threshold: self.low_stock_threshold,
            tags: self.tags.clone(),
            active: self.active,
            featured: self.featured,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> Money { self.price }
    pub fn description(&self) -> &str { &self.description }
    pub fn image(&self) -> &str { &self.image }
    pub fn category(&self) -> &str { &self.category }
    pub fn subcategory(&self) -> Option<&str> { self.subcategory.as_deref() }
    pub fn inventory(&self) -> Quantity { self.inventory }
    pub fn low_stock_threshold(&self) -> u32 { self.low_stock_threshold }
    pub fn sku(&self) -> &Sku { &self.sku }
    pub fn tags(&self) -> &BTreeSet<String> { &self.tags }
    pub fn is_active(&self) -> bool { self.active }
    pub fn is_featured(&self) -> bool { self.featured }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_low_stock(&self) -> bool { self.inventory.value() <= self.low_stock_threshold }

    /// Write every present field. Id, sku and `created_at` are not updatable.
    pub fn apply(&mut self, update: &ProductUpdate, now: DateTime<Utc>) {
        if let Some(name) = &update.name { self.name = name.clone(); }
        if let Some(price) = update.price { self.price = price; }
        if let Some(description) = &update.description { self.description = description.clone(); }
        if let Some(image) = &update.image { self.image = image.clone(); }
        if let Some(category) = &update.category { self.category = category.clone(); }
        if let Some(subcategory) = &update.subcategory {
            self.subcategory = Some(subcategory.clone()).filter(|s| !s.is_empty());
        }
        if let Some(inventory) = update.inventory { self.inventory = Quantity::new(inventory); }
        if let Some(threshold) = update.low_stock_threshold { self.low_stock_threshold = threshold; }
        if let Some(tags) = &update.tags { self.tags = tags.clone(); }
        if let Some(active) = update.active { self.active = active; }
        if let Some(featured) = update.featured { self.featured = featured; }
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) { self.updated_at = now; }
}
