use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use despensa_core::{ItemId, SectionId};
use despensa_infra::BatchReport;
use despensa_inventory::{HistoryRecord, Item, Section};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ProcessTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessCommandsRequest {
    /// Raw model output, exactly as a model would return it.
    pub raw: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListItemsParams {
    pub section_id: Option<SectionId>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub id: SectionId,
    pub name: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl From<Section> for SectionResponse {
    fn from(s: Section) -> Self {
        Self {
            id: s.id,
            name: s.name,
            emoji: s.emoji,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub emoji: String,
    pub quantity: f64,
    pub unit: String,
    pub threshold: f64,
    pub section_id: SectionId,
    pub section_name: Option<String>,
    pub section_emoji: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub is_below_threshold: bool,
}

impl ItemResponse {
    pub fn new(item: Item, sections: &HashMap<SectionId, &Section>) -> Self {
        let section = sections.get(&item.section_id);
        Self {
            is_below_threshold: item.is_below_threshold(),
            section_name: section.map(|s| s.name.clone()),
            section_emoji: section.map(|s| s.emoji.clone()),
            id: item.id,
            name: item.name,
            emoji: item.emoji,
            quantity: item.quantity,
            unit: item.unit,
            threshold: item.threshold,
            section_id: item.section_id,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemsPage {
    pub items: Vec<ItemResponse>,
    pub next_offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub quantity: f64,
    pub changed_at: DateTime<Utc>,
}

impl From<HistoryRecord> for HistoryEntry {
    fn from(h: HistoryRecord) -> Self {
        Self {
            quantity: h.quantity,
            changed_at: h.changed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub changes: Vec<String>,
    pub errors: Vec<String>,
    pub did_change: bool,
}

impl From<BatchReport> for ProcessResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            did_change: report.did_change(),
            changes: report.changes,
            errors: report.errors,
        }
    }
}
