//! Selection and bulk operations.
//!
//! A bulk primitive runs the single-item operation for each selected id, in
//! id order. There is no transaction: ids that fail are reported and the rest
//! stay applied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use super::{CatalogStore, StockMode};
use crate::domain::aggregates::ProductUpdate;
use crate::domain::value_objects::Money;
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    PercentIncrease,
    PercentDecrease,
    AmountIncrease,
    AmountDecrease,
    Set,
}

impl PriceMode {
    /// New price, rounded to cents. Only `AmountDecrease` is floored at zero.
    pub fn apply(self, price: Money, amount: Decimal) -> Money {
        match self {
            PriceMode::PercentIncrease => price.scale_percent(amount),
            PriceMode::PercentDecrease => price.scale_percent(-amount),
            PriceMode::AmountIncrease => price.plus(amount),
            PriceMode::AmountDecrease => price.minus_floored(amount),
            PriceMode::Set => Money::new(amount).round_to_cents(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub results: Vec<BulkItemResult>,
}

impl BulkOutcome {
    fn push<T>(&mut self, id: String, result: Result<T>) {
        let error = result.err().map(|e| e.to_string());
        self.results.push(BulkItemResult { id, ok: error.is_none(), error });
    }

    pub fn succeeded(&self) -> usize { self.results.iter().filter(|r| r.ok).count() }
    pub fn failed(&self) -> usize { self.results.len() - self.succeeded() }
}

impl CatalogStore {
    pub fn selected_products(&self) -> &BTreeSet<String> { &self.selected }

    pub fn bulk_edit_mode(&self) -> bool { self.bulk_edit_mode }

    /// Leaving bulk edit mode drops the selection.
    pub fn toggle_bulk_edit_mode(&mut self) -> bool {
        self.bulk_edit_mode = !self.bulk_edit_mode;
        if !self.bulk_edit_mode {
            self.selected.clear();
        }
        self.bulk_edit_mode
    }

    /// Flip membership of one id. Returns whether it is now selected.
    pub fn toggle_product_selection(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    /// Select every product visible under the `show_inactive` filter.
    pub fn select_all(&mut self) {
        self.selected = self.visible_products().iter().map(|p| p.id().to_string()).collect();
    }

    pub fn clear_selection(&mut self) { self.selected.clear(); }

    pub fn bulk_update_stock(&mut self, amount: u32, mode: StockMode) -> BulkOutcome {
        let outcome = self.for_each_selected(|store, id| store.apply_stock(id, amount, mode));
        tracing::info!(?mode, amount, succeeded = outcome.succeeded(), failed = outcome.failed(), "bulk stock update");
        outcome
    }

    pub fn bulk_update_price(&mut self, amount: Decimal, mode: PriceMode) -> BulkOutcome {
        let outcome = self.for_each_selected(|store, id| {
            let price = mode.apply(store.product(id)?.price(), amount);
            store.apply_update(id, &ProductUpdate::price(price))
        });
        tracing::info!(?mode, %amount, succeeded = outcome.succeeded(), failed = outcome.failed(), "bulk price update");
        outcome
    }

    pub fn bulk_set_active(&mut self, active: bool) -> BulkOutcome {
        let outcome = self.for_each_selected(|store, id| store.apply_update(id, &ProductUpdate::active(active)));
        tracing::info!(active, succeeded = outcome.succeeded(), failed = outcome.failed(), "bulk status update");
        outcome
    }

    /// Delete every selected product, then clear the selection.
    pub fn bulk_delete(&mut self) -> BulkOutcome {
        let outcome = self.for_each_selected(|store, id| store.remove(id));
        self.selected.clear();
        tracing::info!(succeeded = outcome.succeeded(), failed = outcome.failed(), "bulk delete");
        outcome
    }

    fn for_each_selected<T>(&mut self, mut op: impl FnMut(&mut Self, &str) -> Result<T>) -> BulkOutcome {
        let ids: Vec<String> = self.selected.iter().cloned().collect();
        let mut outcome = BulkOutcome::default();
        for id in ids {
            let result = op(self, &id);
            outcome.push(id, result);
        }
        if outcome.succeeded() > 0 {
            self.persist();
        }
        outcome
    }
}
