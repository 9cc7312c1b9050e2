//! Infrastructure layer: storage adapters and the command pipeline.
//!
//! Model output flows through [`assistant::VoiceProcessor`] into the
//! [`batch::BatchExecutor`], which drives the [`interpreter::CommandInterpreter`]
//! over one [`store::InventorySession`] per batch.

pub mod assistant;
pub mod batch;
pub mod interpreter;
pub mod seed;
pub mod snapshot;
pub mod store;


pub use assistant::{NOT_UNDERSTOOD, ProcessError, VoiceProcessor};
pub use batch::{BatchError, BatchExecutor, BatchReport};
pub use interpreter::{CommandInterpreter, InterpretError, Outcome, Rejection};
pub use seed::seed_default_sections;
pub use snapshot::InventorySnapshot;
pub use store::{
    InMemoryInventoryStore, InventorySession, InventoryStore, ItemQuery, SqliteInventoryStore,
    StoreError,
};
