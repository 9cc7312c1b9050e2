use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use despensa_core::{Entity, SectionId};

use crate::naming::{name_key, title_case};

/// Emoji used when a section is created without one.
pub const DEFAULT_SECTION_EMOJI: &str = "📦";

/// A named storage location grouping items (e.g. "Refrigerador").
///
/// Names are unique under case-insensitive comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl Section {
    /// Case-insensitive lookup key of this section's name.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

impl Entity for Section {
    type Id = SectionId;

    fn id(&self) -> SectionId {
        self.id
    }
}

/// A section that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    pub name: String,
    pub emoji: String,
}

impl NewSection {
    /// Build a section with its name in display (title-cased) form.
    pub fn new(name: &str, emoji: Option<&str>) -> Self {
        Self {
            name: title_case(name),
            emoji: emoji
                .filter(|e| !e.trim().is_empty())
                .unwrap_or(DEFAULT_SECTION_EMOJI)
                .to_string(),
        }
    }

    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// Sections every fresh inventory starts with.
pub fn default_sections() -> Vec<NewSection> {
    vec![
        NewSection::new("Refrigerador", Some("🧊")),
        NewSection::new("Almacén 1", Some("📦")),
        NewSection::new("Almacén 2", Some("🏺")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_section_title_cases_and_defaults_emoji() {
        let s = NewSection::new("congelador", None);
        assert_eq!(s.name, "Congelador");
        assert_eq!(s.emoji, DEFAULT_SECTION_EMOJI);

        let blank = NewSection::new("despensa", Some("  "));
        assert_eq!(blank.emoji, DEFAULT_SECTION_EMOJI);
    }

    #[test]
    fn default_sections_have_distinct_keys() {
        let mut keys: Vec<String> = default_sections().iter().map(NewSection::key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }
}
