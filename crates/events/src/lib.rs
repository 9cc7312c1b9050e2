//! Notifications emitted after inventory changes are committed.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod inventory;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use inventory::InventoryEvent;
