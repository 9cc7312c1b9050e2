use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use despensa_core::{DomainError, Entity, HistoryId, ItemId, SectionId};

use crate::naming::name_key;

/// Emoji used when an item is created without one.
pub const DEFAULT_ITEM_EMOJI: &str = "🍽️";
/// Unit used when an item is created without one.
pub const DEFAULT_UNIT: &str = "unidades";
/// Starting quantity when none is given.
pub const DEFAULT_QUANTITY: f64 = 0.0;
/// Alert threshold when none is given.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// A tracked inventory unit.
///
/// Names are not unique; lookups by name are case-insensitive and resolve to
/// the first stored match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub emoji: String,
    pub quantity: f64,
    pub unit: String,
    pub threshold: f64,
    pub section_id: SectionId,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    pub fn is_below_threshold(&self) -> bool {
        self.quantity < self.threshold
    }

    /// Add `delta` to the quantity. Returns `(old, new)`.
    pub fn add_quantity(&mut self, delta: f64, now: DateTime<Utc>) -> (f64, f64) {
        let old = self.quantity;
        self.quantity += delta;
        self.updated_at = now;
        (old, self.quantity)
    }

    /// Overwrite the quantity. Returns `(old, new)`.
    pub fn set_quantity(&mut self, quantity: f64, now: DateTime<Utc>) -> (f64, f64) {
        let old = self.quantity;
        self.quantity = quantity;
        self.updated_at = now;
        (old, self.quantity)
    }

    pub fn move_to(&mut self, section_id: SectionId, now: DateTime<Utc>) {
        self.section_id = section_id;
        self.updated_at = now;
    }

    /// Replace the emoji. Returns the previous one.
    pub fn change_emoji(&mut self, emoji: &str, now: DateTime<Utc>) -> String {
        self.updated_at = now;
        std::mem::replace(&mut self.emoji, emoji.to_string())
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

/// An item that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub emoji: String,
    pub quantity: f64,
    pub unit: String,
    pub threshold: f64,
    pub section_id: SectionId,
}

impl NewItem {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if !self.quantity.is_finite() || !self.threshold.is_finite() {
            return Err(DomainError::validation("quantity and threshold must be finite"));
        }
        Ok(())
    }

    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// Immutable snapshot of an item's quantity after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub item_id: ItemId,
    pub quantity: f64,
    pub changed_at: DateTime<Utc>,
}

impl Entity for HistoryRecord {
    type Id = HistoryId;

    fn id(&self) -> HistoryId {
        self.id
    }
}

/// Render a quantity for change descriptions: whole numbers without a
/// fractional part, everything else with the shortest exact representation.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.is_finite() && quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{}", quantity as i64)
    } else {
        format!("{quantity}")
    }
}
