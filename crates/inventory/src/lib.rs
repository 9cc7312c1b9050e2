//! Inventory domain module.
//!
//! Sections, items and their quantity history, plus the closed set of
//! commands the voice channel can issue against them. Pure domain logic: no
//! IO, no HTTP, no storage.

pub mod command;
pub mod item;
pub mod naming;
pub mod section;

pub use command::{Command, CommandError, CreateItem, TargetType};
pub use item::{HistoryRecord, Item, NewItem, format_quantity};
pub use naming::{name_key, title_case};
pub use section::{NewSection, Section, default_sections};
