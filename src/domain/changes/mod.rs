//! Pending changes, the diff engine and the publish log.
//!
//! Every product mutation is captured as a typed [`PendingChange`]. At most
//! one change per `(product, kind)` is pending at a time: a newer diff of the
//! same kind replaces the older one outright, so `before` always reflects the
//! state prior to the latest edit only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use crate::domain::aggregates::{Product, ProductUpdate};
use crate::domain::value_objects::Money;

/// Number of publish log entries kept; older entries are dropped.
pub const PUBLISH_HISTORY_LIMIT: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Inventory,
    Price,
    Details,
    New,
    Delete,
    Status,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Inventory => "inventory",
            ChangeKind::Price => "price",
            ChangeKind::Details => "details",
            ChangeKind::New => "new",
            ChangeKind::Delete => "delete",
            ChangeKind::Status => "status",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Typed side of a diff; rendered for display through `Display`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ChangeValue {
    Absent,
    Quantity(u32),
    Price(Money),
    Status(bool),
    Text(String),
}

impl fmt::Display for ChangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeValue::Absent => f.write_str("-"),
            ChangeValue::Quantity(n) => write!(f, "{n}"),
            ChangeValue::Price(money) => write!(f, "{money}"),
            ChangeValue::Status(true) => f.write_str("Active"),
            ChangeValue::Status(false) => f.write_str("Inactive"),
            ChangeValue::Text(text) => f.write_str(text),
        }
    }
}

/// An unpublished diff against one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub id: String,
    pub product_id: String,
    /// Product name as it was when the diff was taken.
    pub product_name: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub before: ChangeValue,
    pub after: ChangeValue,
    pub timestamp: DateTime<Utc>,
}

impl PendingChange {
    pub fn new(product: &Product, kind: ChangeKind, before: ChangeValue, after: ChangeValue, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            product_id: product.id().to_string(),
            product_name: product.name().to_string(),
            kind,
            before,
            after,
            timestamp: now,
        }
    }

    pub fn created(product: &Product, now: DateTime<Utc>) -> Self {
        Self::new(product, ChangeKind::New, ChangeValue::Absent, ChangeValue::Text(product.name().to_string()), now)
    }

    pub fn deleted(product: &Product, now: DateTime<Utc>) -> Self {
        Self::new(product, ChangeKind::Delete, ChangeValue::Text(product.name().to_string()), ChangeValue::Absent, now)
    }
}

/// Diff `update` against the pre-write snapshot `current`.
///
/// Inventory, price and status fire only on an actual change. Details fires
/// whenever name, description or category is present in the update, even if
/// the value is unchanged.
pub fn diff(current: &Product, update: &ProductUpdate, now: DateTime<Utc>) -> Vec<PendingChange> {
    let mut changes = Vec::new();

    if let Some(inventory) = update.inventory {
        if inventory != current.inventory().value() {
            changes.push(PendingChange::new(
                current,
                ChangeKind::Inventory,
                ChangeValue::Quantity(current.inventory().value()),
                ChangeValue::Quantity(inventory),
                now,
            ));
        }
    }
    if let Some(price) = update.price {
        if price != current.price() {
            changes.push(PendingChange::new(
                current,
                ChangeKind::Price,
                ChangeValue::Price(current.price()),
                ChangeValue::Price(price),
                now,
            ));
        }
    }
    if let Some(active) = update.active {
        if active != current.is_active() {
            changes.push(PendingChange::new(
                current,
                ChangeKind::Status,
                ChangeValue::Status(current.is_active()),
                ChangeValue::Status(active),
                now,
            ));
        }
    }
    if update.touches_details() {
        changes.push(PendingChange::new(
            current,
            ChangeKind::Details,
            ChangeValue::Text("Details".into()),
            ChangeValue::Text("Updated".into()),
            now,
        ));
    }

    changes
}

/// Append `incoming`, first dropping every pending change for the same
/// product whose kind matches any incoming kind.
pub fn supersede(pending: &mut Vec<PendingChange>, incoming: Vec<PendingChange>) {
    pending.retain(|existing| {
        !incoming.iter().any(|new| new.product_id == existing.product_id && new.kind == existing.kind)
    });
    pending.extend(incoming);
}

/// Immutable audit entry: the pending changes committed by one publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishLog {
    pub id: String,
    pub changes: Vec<PendingChange>,
    pub published_at: DateTime<Utc>,
    pub published_by: String,
}

impl PublishLog {
    pub fn new(changes: Vec<PendingChange>, published_by: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { id: Uuid::now_v7().to_string(), changes, published_at: now, published_by: published_by.into() }
    }
}

/// Prepend `entry` (newest first) and drop anything past the history limit.
pub fn record(history: &mut Vec<PublishLog>, entry: PublishLog) {
    history.insert(0, entry);
    history.truncate(PUBLISH_HISTORY_LIMIT);
}
