//! Publish and discard.
//!
//! Products are edited live; publishing only commits the audit trail.
//! `discard` rolls products back to the seed menu, not to the last publish.

use chrono::Utc;
use super::CatalogStore;
use crate::domain::changes::{self, PublishLog};
use crate::seed;

impl CatalogStore {
    /// Commit all pending changes into a new publish log entry.
    ///
    /// Returns `None` (and does nothing) when there is nothing to publish.
    pub fn publish(&mut self, published_by: &str) -> Option<&PublishLog> {
        if self.pending_changes.is_empty() {
            tracing::debug!("publish skipped, no pending changes");
            return None;
        }
        let committed = std::mem::take(&mut self.pending_changes);
        let count = committed.len();
        changes::record(&mut self.publish_logs, PublishLog::new(committed, published_by, Utc::now()));
        self.published_baseline = self.products.clone();
        tracing::info!(changes = count, published_by, "catalog published");
        self.persist();
        self.publish_logs.first()
    }

    /// Reset products to the seed menu and drop every pending change.
    ///
    /// Products added or removed since the last publish are lost too, and the
    /// publish history is not replayed. Seed categories deleted in the meantime
    /// come back, appended after the current ones, so every restored product
    /// still has its category.
    pub fn discard(&mut self) {
        let dropped = self.pending_changes.len();
        self.products = seed::products();
        self.restore_seed_categories();
        self.pending_changes.clear();
        self.selected.clear();
        tracing::info!(dropped, "catalog discarded to seed menu");
        self.persist();
    }

    fn restore_seed_categories(&mut self) {
        for mut category in seed::categories() {
            if self.categories.iter().any(|c| c.id() == category.id() || c.name() == category.name()) {
                continue;
            }
            let next = self.categories.iter().map(|c| c.order() + 1).max().unwrap_or(0);
            category.set_order(next);
            tracing::info!(category_id = category.id(), name = category.name(), "seed category restored");
            self.categories.push(category);
        }
    }

    /// Reset products to their state at the last publish (or at load time).
    pub fn discard_to_last_publish(&mut self) {
        let dropped = self.pending_changes.len();
        self.products = self.published_baseline.clone();
        self.pending_changes.clear();
        self.selected.clear();
        tracing::info!(dropped, "catalog discarded to last publish");
        self.persist();
    }
}
