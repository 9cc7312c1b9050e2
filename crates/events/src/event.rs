use chrono::{DateTime, Utc};

/// A notification about something that already happened.
///
/// Events are immutable facts; consumers react to them but never reply.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "inventory.changed").
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn occurred_at(&self) -> DateTime<Utc>;
}
