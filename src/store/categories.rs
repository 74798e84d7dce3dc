//! Category management.

use std::collections::HashSet;
use super::CatalogStore;
use crate::domain::aggregates::{Category, CategoryDraft, CategoryUpdate, Product};
use crate::{MenuError, Result};

impl CatalogStore {
    /// Categories in display order.
    pub fn categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.iter().collect();
        categories.sort_by_key(|c| c.order());
        categories
    }

    pub fn category(&self, id: &str) -> Result<&Category> {
        self.categories.iter().find(|c| c.id() == id).ok_or_else(|| MenuError::CategoryNotFound(id.to_string()))
    }

    pub(crate) fn ensure_category(&self, name: &str) -> Result<()> {
        if self.categories.iter().any(|c| c.name() == name) {
            Ok(())
        } else {
            Err(MenuError::CategoryNotFound(name.to_string()))
        }
    }

    pub fn add_category(&mut self, draft: CategoryDraft) -> Result<Category> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(MenuError::Validation("category name must not be empty".into()));
        }
        if self.categories.iter().any(|c| c.name().eq_ignore_ascii_case(name)) {
            return Err(MenuError::Validation(format!("category '{name}' already exists")));
        }
        if let Some(parent) = &draft.parent_id {
            self.category(parent)?;
        }

        let draft = CategoryDraft { name: name.to_string(), ..draft };
        let category = Category::create(draft, self.categories.len() as u32);
        tracing::info!(category_id = category.id(), name = category.name(), "category added");
        self.categories.push(category.clone());
        self.persist();
        Ok(category)
    }

    pub fn update_category(&mut self, id: &str, update: CategoryUpdate) -> Result<Category> {
        if let Some(parent) = update.parent_id.as_deref().filter(|p| !p.is_empty()) {
            if parent == id {
                return Err(MenuError::Validation("category cannot be its own parent".into()));
            }
            self.category(parent)?;
        }
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| MenuError::CategoryNotFound(id.to_string()))?;
        category.apply(&update);
        let updated = category.clone();
        self.persist();
        Ok(updated)
    }

    /// Remove a category no product refers to, neither live nor in the last
    /// published baseline. Children are detached; the remaining `order`
    /// values keep their gaps.
    pub fn delete_category(&mut self, id: &str) -> Result<Category> {
        let index = self
            .categories
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| MenuError::CategoryNotFound(id.to_string()))?;
        let name = self.categories[index].name().to_string();
        let referenced = |products: &[Product]| products.iter().any(|p| p.category() == name);
        if referenced(&self.products) || referenced(&self.published_baseline) {
            return Err(MenuError::CategoryInUse(name));
        }

        let removed = self.categories.remove(index);
        for child in self.categories.iter_mut().filter(|c| c.parent_id() == Some(id)) {
            child.apply(&CategoryUpdate { parent_id: Some(String::new()), ..Default::default() });
        }
        tracing::info!(category_id = id, name = %name, "category deleted");
        self.persist();
        Ok(removed)
    }

    /// Give the listed categories orders 0..n in list order (first occurrence
    /// wins for repeated ids); unlisted ones follow in their previous relative order.
    pub fn reorder_categories(&mut self, ids: &[String]) -> Result<()> {
        for id in ids {
            self.category(id)?;
        }
        let mut rest: Vec<String> = self
            .categories()
            .into_iter()
            .map(|c| c.id().to_string())
            .filter(|id| !ids.contains(id))
            .collect();
        let mut seen = HashSet::new();
        let mut sequence: Vec<String> = ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect();
        sequence.append(&mut rest);

        for (order, id) in sequence.iter().enumerate() {
            if let Some(category) = self.categories.iter_mut().find(|c| c.id() == id) {
                category.set_order(order as u32);
            }
        }
        self.persist();
        Ok(())
    }
}
