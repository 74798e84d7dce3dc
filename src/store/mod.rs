//! Catalog store: the single owner of menu state.
//!
//! Every product mutation funnels through one update entry point which diffs
//! against the pre-write snapshot, applies the write and records the diffs as
//! pending changes. The store is synchronous; callers sharing it across tasks
//! must serialize access (the HTTP layer holds it behind one mutex).

mod bulk;
mod categories;
mod publish;

pub use bulk::{BulkItemResult, BulkOutcome, PriceMode};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use crate::domain::aggregates::{Category, Product, ProductDraft, ProductUpdate};
use crate::domain::changes::{self, PendingChange, PublishLog};
use crate::domain::value_objects::{Quantity, Sku};
use crate::persistence::{BlobStore, MemoryBlobStore, PersistedState, SnapshotWriter};
use crate::{seed, MenuError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockMode {
    Add,
    Remove,
    Set,
}

impl StockMode {
    pub fn apply(self, current: Quantity, amount: u32) -> Quantity {
        match self {
            StockMode::Add => current.add(amount),
            StockMode::Remove => current.subtract(amount),
            StockMode::Set => Quantity::new(amount),
        }
    }
}

pub struct CatalogStore {
    products: Vec<Product>,
    categories: Vec<Category>,
    pending_changes: Vec<PendingChange>,
    publish_logs: Vec<PublishLog>,
    /// Products as of the last publish (or load), restored by `discard_to_last_publish`.
    published_baseline: Vec<Product>,
    selected: BTreeSet<String>,
    bulk_edit_mode: bool,
    show_inactive: bool,
    writer: SnapshotWriter,
    persist_drafts: bool,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("products", &self.products.len())
            .field("categories", &self.categories.len())
            .field("pending_changes", &self.pending_changes.len())
            .field("publish_logs", &self.publish_logs.len())
            .field("selected", &self.selected.len())
            .finish()
    }
}

impl CatalogStore {
    /// Load persisted state from `blobs`, falling back to the seed catalog.
    ///
    /// With `persist_drafts`, pending changes are written and restored too.
    pub fn open(blobs: Arc<dyn BlobStore>, persist_drafts: bool) -> Result<Self> {
        let state = match PersistedState::load(blobs.as_ref())? {
            Some(state) => {
                tracing::info!(products = state.products.len(), publish_logs = state.publish_logs.len(), "loaded persisted catalog");
                state
            }
            None => {
                tracing::info!("no persisted catalog, starting from seed menu");
                PersistedState { products: seed::products(), categories: seed::categories(), ..Default::default() }
            }
        };
        let pending_changes = if persist_drafts { state.pending_changes.unwrap_or_default() } else { Vec::new() };

        Ok(Self {
            published_baseline: state.products.clone(),
            products: state.products,
            categories: state.categories,
            pending_changes,
            publish_logs: state.publish_logs,
            selected: BTreeSet::new(),
            bulk_edit_mode: false,
            show_inactive: true,
            writer: SnapshotWriter::new(blobs),
            persist_drafts,
        })
    }

    /// Seeded store backed by an in-memory blob store.
    pub fn in_memory() -> Self {
        let products = seed::products();
        Self {
            published_baseline: products.clone(),
            products,
            categories: seed::categories(),
            pending_changes: Vec::new(),
            publish_logs: Vec::new(),
            selected: BTreeSet::new(),
            bulk_edit_mode: false,
            show_inactive: true,
            writer: SnapshotWriter::new(Arc::new(MemoryBlobStore::new())),
            persist_drafts: false,
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn products(&self) -> &[Product] { &self.products }

    pub fn product(&self, id: &str) -> Result<&Product> {
        self.products.iter().find(|p| p.id() == id).ok_or_else(|| MenuError::ProductNotFound(id.to_string()))
    }

    /// Products shown under the current `show_inactive` filter.
    pub fn visible_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| self.show_inactive || p.is_active()).collect()
    }

    pub fn low_stock_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_low_stock()).collect()
    }

    pub fn pending_changes(&self) -> &[PendingChange] { &self.pending_changes }

    /// Newest first.
    pub fn publish_logs(&self) -> &[PublishLog] { &self.publish_logs }

    /// True while there are unpublished changes.
    pub fn is_dirty(&self) -> bool { !self.pending_changes.is_empty() }

    pub fn show_inactive(&self) -> bool { self.show_inactive }

    pub fn set_show_inactive(&mut self, show: bool) { self.show_inactive = show; }

    // ---------------------------------------------------------------------
    // Product mutations
    // ---------------------------------------------------------------------

    /// The single update entry point. Returns the diffs this call produced.
    pub fn update_product(&mut self, id: &str, update: ProductUpdate) -> Result<Vec<PendingChange>> {
        let changes = self.apply_update(id, &update)?;
        self.persist();
        Ok(changes)
    }

    pub(crate) fn apply_update(&mut self, id: &str, update: &ProductUpdate) -> Result<Vec<PendingChange>> {
        if let Some(category) = &update.category {
            self.ensure_category(category)?;
        }
        let now = Utc::now();
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| MenuError::ProductNotFound(id.to_string()))?;

        let produced = changes::diff(product, update, now);
        product.apply(update, now);
        tracing::debug!(product_id = id, diffs = produced.len(), "product updated");
        changes::supersede(&mut self.pending_changes, produced.clone());
        Ok(produced)
    }

    pub fn add_product(&mut self, draft: ProductDraft) -> Result<Product> {
        self.ensure_category(&draft.category)?;
        let sku = self.allocate_sku(&draft.category);
        let product = Product::create(sku, draft, Utc::now());
        tracing::info!(product_id = product.id(), sku = %product.sku(), "product added");
        self.insert(product.clone());
        self.persist();
        Ok(product)
    }

    /// Copy a product under a freshly allocated sku. The source's category
    /// must still exist.
    pub fn duplicate_product(&mut self, id: &str) -> Result<Product> {
        let source = self.product(id)?;
        self.ensure_category(source.category())?;
        let sku = self.allocate_sku(source.category());
        let copy = source.duplicate(sku, Utc::now());
        tracing::info!(source_id = id, product_id = copy.id(), sku = %copy.sku(), "product duplicated");
        self.insert(copy.clone());
        self.persist();
        Ok(copy)
    }

    /// Remove a product and purge it from the selection.
    pub fn delete_product(&mut self, id: &str) -> Result<Product> {
        let removed = self.remove(id)?;
        self.persist();
        Ok(removed)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Result<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| MenuError::ProductNotFound(id.to_string()))?;
        let removed = self.products.remove(index);
        self.selected.remove(id);
        changes::supersede(&mut self.pending_changes, vec![PendingChange::deleted(&removed, Utc::now())]);
        tracing::info!(product_id = id, "product deleted");
        Ok(removed)
    }

    /// Adjust inventory through the update entry point, so it records an inventory diff.
    pub fn adjust_stock(&mut self, id: &str, amount: u32, mode: StockMode) -> Result<Vec<PendingChange>> {
        let changes = self.apply_stock(id, amount, mode)?;
        self.persist();
        Ok(changes)
    }

    pub(crate) fn apply_stock(&mut self, id: &str, amount: u32, mode: StockMode) -> Result<Vec<PendingChange>> {
        let current = self.product(id)?.inventory();
        let inventory = mode.apply(current, amount).value();
        self.apply_update(id, &ProductUpdate::inventory(inventory))
    }

    fn insert(&mut self, product: Product) {
        let created = PendingChange::created(&product, product.created_at());
        self.products.push(product);
        changes::supersede(&mut self.pending_changes, vec![created]);
    }

    fn allocate_sku(&self, category: &str) -> Sku {
        Sku::allocate(category, self.products.iter().map(Product::sku))
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Wait for the latest persisted snapshot to reach the blob store.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    fn snapshot(&self) -> PersistedState {
        PersistedState {
            products: self.products.clone(),
            categories: self.categories.clone(),
            publish_logs: self.publish_logs.clone(),
            pending_changes: self.persist_drafts.then(|| self.pending_changes.clone()),
        }
    }

    /// Best-effort write; in-memory state stays authoritative if it fails.
    ///
    /// The snapshot is serialized here, under the caller's exclusive borrow;
    /// the blob write itself happens off the async workers.
    fn persist(&self) {
        match self.snapshot().to_bytes() {
            Ok(bytes) => self.writer.submit(bytes),
            Err(e) => tracing::warn!(error = %e, "failed to serialize catalog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::changes::ChangeKind;
    use crate::domain::value_objects::Money;

    fn store() -> CatalogStore { CatalogStore::in_memory() }

    fn draft(name: &str, category: &str) -> ProductDraft {
        ProductDraft { name: name.into(), price: Money::from_cents(500), category: category.into(), active: true, ..Default::default() }
    }

    #[test]
    fn test_second_edit_of_same_kind_replaces_first() {
        let mut s = store();
        s.update_product("prod-003", ProductUpdate::price(Money::from_cents(1200))).unwrap();
        s.update_product("prod-003", ProductUpdate::price(Money::from_cents(1500))).unwrap();

        let prices: Vec<&PendingChange> = s.pending_changes().iter().filter(|c| c.kind == ChangeKind::Price).collect();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].before.to_string(), "$12.00");
        assert_eq!(prices[0].after.to_string(), "$15.00");
    }

    #[test]
    fn test_edit_of_different_kind_is_preserved() {
        let mut s = store();
        s.update_product("prod-003", ProductUpdate::price(Money::from_cents(1200))).unwrap();
        s.update_product("prod-003", ProductUpdate::inventory(2)).unwrap();
        s.update_product("prod-004", ProductUpdate::price(Money::from_cents(1100))).unwrap();
        assert_eq!(s.pending_changes().len(), 3);
    }

    #[test]
    fn test_multi_field_update_returns_two_diffs() {
        let mut s = store();
        s.update_product("prod-003", ProductUpdate { price: Some(Money::from_cents(1000)), inventory: Some(8), ..Default::default() }).unwrap();
        let produced = s
            .update_product("prod-003", ProductUpdate { price: Some(Money::from_cents(2000)), inventory: Some(5), ..Default::default() })
            .unwrap();
        assert_eq!(produced.len(), 2);
        assert_eq!(s.pending_changes().len(), 2);
        assert_eq!(s.product("prod-003").unwrap().inventory().value(), 5);
    }

    #[test]
    fn test_update_unknown_product_is_not_found() {
        let mut s = store();
        let err = s.update_product("nope", ProductUpdate::inventory(1)).unwrap_err();
        assert!(matches!(err, MenuError::ProductNotFound(id) if id == "nope"));
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_update_to_unknown_category_is_rejected() {
        let mut s = store();
        let update = ProductUpdate { category: Some("Soups".into()), ..Default::default() };
        assert!(matches!(s.update_product("prod-001", update), Err(MenuError::CategoryNotFound(_))));
        assert_eq!(s.product("prod-001").unwrap().category(), "Pizza");
    }

    #[test]
    fn test_add_product_allocates_next_sku_and_records_new() {
        let mut s = store();
        let first = s.add_product(draft("Hawaiian", "Pizza")).unwrap();
        let second = s.add_product(draft("Calzone", "Pizza")).unwrap();
        assert_eq!(first.sku().as_str(), "HP-PIZ-003");
        assert_eq!(second.sku().as_str(), "HP-PIZ-004");
        assert_eq!(s.pending_changes().iter().filter(|c| c.kind == ChangeKind::New).count(), 2);
        assert_eq!(s.pending_changes()[0].after.to_string(), "Hawaiian");
    }

    #[test]
    fn test_duplicate_gets_new_sku() {
        let mut s = store();
        let copy = s.duplicate_product("prod-001").unwrap();
        assert_eq!(copy.sku().as_str(), "HP-PIZ-003");
        assert_eq!(copy.name(), "Margherita (Copy)");
        assert_eq!(s.product("prod-001").unwrap().sku().as_str(), "HP-PIZ-001");
    }

    #[test]
    fn test_duplicate_with_missing_category_is_rejected() {
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let categories = seed::categories().into_iter().filter(|c| c.name() != "Desserts").collect();
        PersistedState { products: seed::products(), categories, ..Default::default() }.save(blobs.as_ref()).unwrap();

        let mut s = CatalogStore::open(blobs, false).unwrap();
        assert!(matches!(s.duplicate_product("prod-008"), Err(MenuError::CategoryNotFound(name)) if name == "Desserts"));
        assert_eq!(s.products().len(), 8);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_delete_purges_selection_and_records_delete() {
        let mut s = store();
        s.toggle_product_selection("prod-002");
        let removed = s.delete_product("prod-002").unwrap();
        assert_eq!(removed.name(), "Pepperoni");
        assert!(s.selected_products().is_empty());
        assert!(s.product("prod-002").is_err());
        let change = &s.pending_changes()[0];
        assert_eq!((change.kind, change.before.to_string(), change.after.to_string()), (ChangeKind::Delete, String::from("Pepperoni"), String::from("-")));
    }

    #[test]
    fn test_adjust_stock_floors_at_zero() {
        let mut s = store();
        s.update_product("prod-008", ProductUpdate::inventory(30)).unwrap();
        s.adjust_stock("prod-008", 100, StockMode::Remove).unwrap();
        assert_eq!(s.product("prod-008").unwrap().inventory().value(), 0);
        let inventory: Vec<&PendingChange> = s.pending_changes().iter().filter(|c| c.kind == ChangeKind::Inventory).collect();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].before.to_string(), "30");
        assert_eq!(inventory[0].after.to_string(), "0");
    }

    #[test]
    fn test_adjust_stock_modes() {
        let mut s = store();
        s.adjust_stock("prod-001", 5, StockMode::Add).unwrap();
        assert_eq!(s.product("prod-001").unwrap().inventory().value(), 45);
        s.adjust_stock("prod-001", 7, StockMode::Set).unwrap();
        assert_eq!(s.product("prod-001").unwrap().inventory().value(), 7);
    }

    #[test]
    fn test_visible_products_respect_show_inactive() {
        let mut s = store();
        assert_eq!(s.visible_products().len(), 8);
        s.set_show_inactive(false);
        assert!(s.visible_products().iter().all(|p| p.is_active()));
        assert_eq!(s.visible_products().len(), 7);
    }

    #[test]
    fn test_low_stock_products() {
        let s = store();
        let names: Vec<&str> = s.low_stock_products().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Veggie Burger", "Lemonade"]);
    }

    #[test]
    fn test_reopen_restores_products_but_not_drafts() {
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let mut s = CatalogStore::open(blobs.clone(), false).unwrap();
        s.update_product("prod-001", ProductUpdate::price(Money::from_cents(1199))).unwrap();

        let reopened = CatalogStore::open(blobs, false).unwrap();
        assert_eq!(reopened.product("prod-001").unwrap().price(), Money::from_cents(1199));
        assert!(!reopened.is_dirty());
    }

    #[test]
    fn test_reopen_with_draft_persistence_restores_pending() {
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let mut s = CatalogStore::open(blobs.clone(), true).unwrap();
        s.update_product("prod-001", ProductUpdate::price(Money::from_cents(1199))).unwrap();

        let reopened = CatalogStore::open(blobs, true).unwrap();
        assert_eq!(reopened.pending_changes(), s.pending_changes());
    }

    #[tokio::test]
    async fn test_writes_inside_runtime_land_after_flush() {
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let mut s = CatalogStore::open(blobs.clone(), false).unwrap();
        for cents in [1100, 1200, 1300] {
            s.update_product("prod-001", ProductUpdate::price(Money::from_cents(cents))).unwrap();
        }
        s.flush().await;

        let reopened = CatalogStore::open(blobs, false).unwrap();
        assert_eq!(reopened.product("prod-001").unwrap().price(), Money::from_cents(1300));
    }

    struct FailingBlobs;

    impl BlobStore for FailingBlobs {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> { Ok(None) }
        fn put(&self, _key: &str, _value: &[u8]) -> Result<()> { Err(MenuError::StorageError("disk full".into())) }
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let mut s = CatalogStore::open(Arc::new(FailingBlobs), false).unwrap();
        s.update_product("prod-001", ProductUpdate::inventory(1)).unwrap();
        assert_eq!(s.product("prod-001").unwrap().inventory().value(), 1);
        assert!(s.is_dirty());
    }
}
