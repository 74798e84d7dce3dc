//! Category Aggregate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Menu category. Products reference categories by `name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: String,
    name: String,
    icon: Option<String>,
    parent_id: Option<String>,
    order: u32,
    active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryDraft {
    pub name: String,
    pub icon: Option<String>,
    pub parent_id: Option<String>,
}

/// Category names are not editable: products hold them by value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryUpdate {
    pub icon: Option<String>,
    pub parent_id: Option<String>,
    pub order: Option<u32>,
    pub active: Option<bool>,
}

impl Category {
    /// New categories are active and ordered after everything created before them.
    pub fn create(draft: CategoryDraft, order: u32) -> Self {
        Self::with_id(Uuid::now_v7().to_string(), draft, order)
    }

    pub(crate) fn with_id(id: String, draft: CategoryDraft, order: u32) -> Self {
        Self { id, name: draft.name, icon: draft.icon, parent_id: draft.parent_id, order, active: true }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn icon(&self) -> Option<&str> { self.icon.as_deref() }
    pub fn parent_id(&self) -> Option<&str> { self.parent_id.as_deref() }
    pub fn order(&self) -> u32 { self.order }
    pub fn is_active(&self) -> bool { self.active }

    pub fn apply(&mut self, update: &CategoryUpdate) {
        if let Some(icon) = &update.icon { self.icon = Some(icon.clone()).filter(|i| !i.is_empty()); }
        if let Some(parent) = &update.parent_id { self.parent_id = Some(parent.clone()).filter(|p| !p.is_empty()); }
        if let Some(order) = update.order { self.order = order; }
        if let Some(active) = update.active { self.active = active; }
    }

    pub(crate) fn set_order(&mut self, order: u32) { self.order = order; }
}
