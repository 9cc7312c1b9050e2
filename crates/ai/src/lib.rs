//! `despensa-ai`
//!
//! **Responsibility:** boundary with the text-completion model.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It must not depend on inventory types.
//! - It must not mutate inventory state.
//! - It turns free text into untrusted command objects; validating and
//!   applying them is the caller's job.

pub mod error;
pub mod extract;
pub mod model;
pub mod openrouter;
pub mod prompt;

pub use error::AiError;
pub use extract::{CommandExtractor, DEFAULT_MAX_RESPONSE_BYTES, RawCommand, extract};
pub use model::{FixedResponseModel, LanguageModel};
pub use openrouter::{OpenRouterClient, OpenRouterConfig};
pub use prompt::{SYSTEM_PROMPT, build_prompt};
