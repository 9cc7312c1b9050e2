//! Command interpreter: the state-transition engine.
//!
//! Applies one [`Command`] to the inventory through an open
//! [`InventorySession`] and describes what changed. Every handler performs its
//! lookups and checks before its first write, so a rejected command leaves the
//! session untouched.
//!
//! | action | change text |
//! |--------|-------------|
//! | `add` | `Agregado: leche 2 → 4 L` |
//! | `set` | `Actualizado: huevos 3 → 6 unidades` |
//! | `create_item` | `Creado: 🥛 yogurt (4 unidades) en Refrigerador` |
//! | `create_section` | `Creada sección: ❄️ Congelador` |
//! | `move_item` | `Movido: yogurt de Refrigerador → Congelador` |
//! | `change_emoji` | `Emoji cambiado: yogurt 🥛 → 🍦` |
//! | `delete_item` | `Eliminado: 🍚 arroz` |
//! | `delete_section` | `Eliminada sección: 🏺 Almacén 2` |
//! | `remove` | `Eliminado: arroz` |
//!
//! `create_item` on a name that already exists reports the `set` text.

use chrono::Utc;
use thiserror::Error;

use despensa_ai::RawCommand;
use despensa_core::DomainError;
use despensa_inventory::item::{
    DEFAULT_ITEM_EMOJI, DEFAULT_QUANTITY, DEFAULT_THRESHOLD, DEFAULT_UNIT,
};
use despensa_inventory::{
    Command, CommandError, CreateItem, Item, NewItem, NewSection, Section, TargetType,
    format_quantity,
};

use crate::store::{InventorySession, StoreError};

/// Section used by `create_item` when none is named.
pub const DEFAULT_ITEM_SECTION: &str = "almacén 1";

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The inventory changed; human-readable description.
    Changed(String),
    /// Action outside the supported set. Nothing was done.
    Ignored { action: String },
}

/// A command refused because of the current inventory state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Item '{0}' no existe")]
    ItemNotFound(String),

    #[error("Item '{0}' no existe (usar create_item)")]
    ItemNotFoundUseCreate(String),

    #[error("Sección '{0}' no existe")]
    SectionNotFound(String),

    #[error("Sección '{0}' ya existe")]
    SectionExists(String),

    #[error("Sección '{name}' no está vacía ({items} items)")]
    SectionNotEmpty { name: String, items: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpretError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Invalid(#[from] CommandError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl InterpretError {
    /// Whether the whole batch has to be abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(self, InterpretError::Store(err) if err.is_fatal())
    }
}

#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    default_section: String,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_SECTION)
    }
}

impl CommandInterpreter {
    pub fn new(default_section: impl Into<String>) -> Self {
        Self {
            default_section: default_section.into(),
        }
    }

    /// Validate the fields of `raw` and apply it.
    pub async fn apply_raw(
        &self,
        session: &mut dyn InventorySession,
        raw: &RawCommand,
    ) -> Result<Outcome, InterpretError> {
        let command = Command::from_fields(raw.fields())?;
        self.apply(session, &command).await
    }

    pub async fn apply(
        &self,
        session: &mut dyn InventorySession,
        command: &Command,
    ) -> Result<Outcome, InterpretError> {
        let text = match command {
            Command::Add { item, quantity } => add(session, item, *quantity).await?,
            Command::Set { item, quantity } => set(session, item, *quantity).await?,
            Command::CreateItem(create) => self.create_item(session, create).await?,
            Command::CreateSection { section, emoji } => {
                create_section(session, section, emoji.as_deref()).await?
            }
            Command::MoveItem { item, section } => move_item(session, item, section).await?,
            Command::ChangeEmoji {
                target_type,
                target,
                emoji,
            } => change_emoji(session, *target_type, target, emoji).await?,
            Command::DeleteItem { item } => {
                let deleted = delete_item(session, item).await?;
                format!("Eliminado: {} {}", deleted.emoji, deleted.name)
            }
            Command::Remove { item } => {
                let deleted = delete_item(session, item).await?;
                format!("Eliminado: {}", deleted.name)
            }
            Command::DeleteSection { section } => delete_section(session, section).await?,
            Command::Unrecognized { action } => {
                return Ok(Outcome::Ignored {
                    action: action.clone(),
                });
            }
        };
        Ok(Outcome::Changed(text))
    }

    async fn create_item(
        &self,
        session: &mut dyn InventorySession,
        create: &CreateItem,
    ) -> Result<String, InterpretError> {
        if let Some(mut existing) = session.find_item_by_name(&create.item).await? {
            let quantity = create.quantity.unwrap_or(existing.quantity);
            let (old, new) = existing.set_quantity(quantity, Utc::now());
            session.update_item(&existing).await?;
            session.record_history(existing.id, new).await?;
            return Ok(quantity_change("Actualizado", &existing, old, new));
        }

        let section_name = create.section.as_deref().unwrap_or(&self.default_section);
        let section = match session.find_section_by_name(section_name).await? {
            Some(section) => section,
            None => {
                session
                    .create_section(NewSection::new(section_name, create.section_emoji.as_deref()))
                    .await?
            }
        };

        let new = NewItem {
            name: create.item.clone(),
            emoji: create.emoji.clone().unwrap_or_else(|| DEFAULT_ITEM_EMOJI.to_string()),
            quantity: create.quantity.unwrap_or(DEFAULT_QUANTITY),
            unit: create.unit.clone().unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            threshold: create.threshold.unwrap_or(DEFAULT_THRESHOLD),
            section_id: section.id,
        };
        new.validate()?;

        let item = session.create_item(new).await?;
        session.record_history(item.id, item.quantity).await?;

        Ok(format!(
            "Creado: {} {} ({} {}) en {}",
            item.emoji,
            item.name,
            format_quantity(item.quantity),
            item.unit,
            section.name
        ))
    }
}

fn quantity_change(verb: &str, item: &Item, old: f64, new: f64) -> String {
    format!(
        "{verb}: {} {} → {} {}",
        item.name,
        format_quantity(old),
        format_quantity(new),
        item.unit
    )
}

async fn require_item(
    session: &mut dyn InventorySession,
    name: &str,
) -> Result<Item, InterpretError> {
    session
        .find_item_by_name(name)
        .await?
        .ok_or_else(|| Rejection::ItemNotFound(name.to_string()).into())
}

async fn require_section(
    session: &mut dyn InventorySession,
    name: &str,
) -> Result<Section, InterpretError> {
    session
        .find_section_by_name(name)
        .await?
        .ok_or_else(|| Rejection::SectionNotFound(name.to_string()).into())
}

async fn add(
    session: &mut dyn InventorySession,
    name: &str,
    delta: f64,
) -> Result<String, InterpretError> {
    let mut item = session
        .find_item_by_name(name)
        .await?
        .ok_or_else(|| Rejection::ItemNotFoundUseCreate(name.to_string()))?;

    let (old, new) = item.add_quantity(delta, Utc::now());
    if !new.is_finite() {
        return Err(DomainError::validation("quantity overflow").into());
    }
    session.update_item(&item).await?;
    session.record_history(item.id, new).await?;
    Ok(quantity_change("Agregado", &item, old, new))
}

async fn set(
    session: &mut dyn InventorySession,
    name: &str,
    quantity: f64,
) -> Result<String, InterpretError> {
    let mut item = require_item(session, name).await?;
    let (old, new) = item.set_quantity(quantity, Utc::now());
    session.update_item(&item).await?;
    session.record_history(item.id, new).await?;
    Ok(quantity_change("Actualizado", &item, old, new))
}

async fn create_section(
    session: &mut dyn InventorySession,
    name: &str,
    emoji: Option<&str>,
) -> Result<String, InterpretError> {
    if session.find_section_by_name(name).await?.is_some() {
        return Err(Rejection::SectionExists(name.to_string()).into());
    }

    let section = session.create_section(NewSection::new(name, emoji)).await?;
    Ok(format!("Creada sección: {} {}", section.emoji, section.name))
}

async fn move_item(
    session: &mut dyn InventorySession,
    item_name: &str,
    section_name: &str,
) -> Result<String, InterpretError> {
    let mut item = require_item(session, item_name).await?;
    let destination = require_section(session, section_name).await?;
    let origin = session
        .section(item.section_id)
        .await?
        .map(|s| s.name)
        .unwrap_or_else(|| "?".to_string());

    item.move_to(destination.id, Utc::now());
    session.update_item(&item).await?;
    Ok(format!("Movido: {} de {} → {}", item.name, origin, destination.name))
}

async fn change_emoji(
    session: &mut dyn InventorySession,
    target_type: TargetType,
    target: &str,
    emoji: &str,
) -> Result<String, InterpretError> {
    let (name, old) = match target_type {
        TargetType::Item => {
            let mut item = require_item(session, target).await?;
            let old = item.change_emoji(emoji, Utc::now());
            session.update_item(&item).await?;
            (item.name, old)
        }
        TargetType::Section => {
            let mut section = require_section(session, target).await?;
            let old = std::mem::replace(&mut section.emoji, emoji.to_string());
            session.update_section(&section).await?;
            (section.name, old)
        }
    };
    Ok(format!("Emoji cambiado: {name} {old} → {emoji}"))
}

async fn delete_item(
    session: &mut dyn InventorySession,
    name: &str,
) -> Result<Item, InterpretError> {
    let item = require_item(session, name).await?;
    session.delete_item(item.id).await?;
    Ok(item)
}

async fn delete_section(
    session: &mut dyn InventorySession,
    name: &str,
) -> Result<String, InterpretError> {
    let section = require_section(session, name).await?;
    let items = session.list_items_in_section(section.id).await?;
    if !items.is_empty() {
        return Err(Rejection::SectionNotEmpty {
            name: section.name,
            items: items.len(),
        }
        .into());
    }

    session.delete_section(section.id).await?;
    Ok(format!("Eliminada sección: {} {}", section.emoji, section.name))
}
