//! Inventory commands issued by the voice channel.
//!
//! A command arrives as a flat JSON object with an `action` discriminator.
//! [`Command::from_fields`] turns that object into one variant of a closed
//! enum, checking the fields each action needs. Actions outside the supported
//! set become [`Command::Unrecognized`] so callers can see (and skip) them.

use serde_json::{Map, Value};
use thiserror::Error;

/// What a `change_emoji` command points at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TargetType {
    Item,
    Section,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Item => "item",
            TargetType::Section => "section",
        }
    }
}

/// Payload of `create_item`; everything but the name is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateItem {
    pub item: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub threshold: Option<f64>,
    pub emoji: Option<String>,
    pub section: Option<String>,
    pub section_emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { item: String, quantity: f64 },
    Set { item: String, quantity: f64 },
    CreateItem(CreateItem),
    CreateSection { section: String, emoji: Option<String> },
    MoveItem { item: String, section: String },
    ChangeEmoji { target_type: TargetType, target: String, emoji: String },
    DeleteItem { item: String },
    DeleteSection { section: String },
    /// Older spelling of `delete_item`.
    Remove { item: String },
    Unrecognized { action: String },
}

/// A command whose fields do not fit its action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("falta la acción")]
    MissingAction,

    #[error("falta el campo '{0}'")]
    MissingField(&'static str),

    #[error("el campo '{field}' debe ser {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("target_type inválido '{0}' (usar 'item' o 'section')")]
    InvalidTargetType(String),
}

impl Command {
    /// Interpret one command object.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, CommandError> {
        let action = match fields.get("action") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
            _ => return Err(CommandError::MissingAction),
        };

        let command = match action {
            "add" => Command::Add {
                item: required_name(fields, "item")?,
                quantity: required_number(fields, "quantity")?,
            },
            "set" => Command::Set {
                item: required_name(fields, "item")?,
                quantity: required_number(fields, "quantity")?,
            },
            "create_item" => Command::CreateItem(CreateItem {
                item: required_name(fields, "item")?,
                quantity: optional_number(fields, "quantity")?,
                unit: optional_text(fields, "unit")?,
                threshold: optional_number(fields, "threshold")?,
                emoji: optional_text(fields, "emoji")?,
                section: optional_text(fields, "section")?,
                section_emoji: optional_text(fields, "section_emoji")?,
            }),
            "create_section" => Command::CreateSection {
                section: required_name(fields, "section")?,
                emoji: optional_text(fields, "emoji")?,
            },
            "move_item" => Command::MoveItem {
                item: required_name(fields, "item")?,
                section: required_name(fields, "section")?,
            },
            "change_emoji" => {
                let target_type = parse_target_type(fields)?;
                let target = match optional_text(fields, "target")? {
                    Some(target) => target,
                    None => required_name(fields, target_type_field(target_type))?,
                };
                Command::ChangeEmoji {
                    target_type,
                    target,
                    emoji: required_name(fields, "emoji")?,
                }
            }
            "delete_item" => Command::DeleteItem {
                item: required_name(fields, "item")?,
            },
            "delete_section" => Command::DeleteSection {
                section: required_name(fields, "section")?,
            },
            "remove" => Command::Remove {
                item: required_name(fields, "item")?,
            },
            other => Command::Unrecognized {
                action: other.to_string(),
            },
        };

        Ok(command)
    }

    /// Wire name of the action.
    pub fn action(&self) -> &str {
        match self {
            Command::Add { .. } => "add",
            Command::Set { .. } => "set",
            Command::CreateItem(_) => "create_item",
            Command::CreateSection { .. } => "create_section",
            Command::MoveItem { .. } => "move_item",
            Command::ChangeEmoji { .. } => "change_emoji",
            Command::DeleteItem { .. } => "delete_item",
            Command::DeleteSection { .. } => "delete_section",
            Command::Remove { .. } => "remove",
            Command::Unrecognized { action } => action,
        }
    }
}

fn target_type_field(target_type: TargetType) -> &'static str {
    match target_type {
        TargetType::Item => "item",
        TargetType::Section => "section",
    }
}

fn parse_target_type(fields: &Map<String, Value>) -> Result<TargetType, CommandError> {
    let raw = required_name(fields, "target_type")?;
    match raw.to_lowercase().as_str() {
        "item" => Ok(TargetType::Item),
        "section" => Ok(TargetType::Section),
        _ => Err(CommandError::InvalidTargetType(raw)),
    }
}

fn required_name(fields: &Map<String, Value>, field: &'static str) -> Result<String, CommandError> {
    optional_text(fields, field)?.ok_or(CommandError::MissingField(field))
}

fn optional_text(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, CommandError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(CommandError::InvalidField {
            field,
            expected: "un texto",
        }),
    }
}

fn required_number(fields: &Map<String, Value>, field: &'static str) -> Result<f64, CommandError> {
    optional_number(fields, field)?.ok_or(CommandError::MissingField(field))
}

fn optional_number(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, CommandError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(CommandError::InvalidField {
                field,
                expected: "un número finito",
            }),
        },
        Some(_) => Err(CommandError::InvalidField {
            field,
            expected: "un número",
        }),
    }
}
