//! # Caravel Stores
//!
//! In-memory implementations of the caravel-core store traits, plus the
//! realtime event bus used by the progress feed. The in-memory stores are the
//! defaults for development and testing; swapping in a database-backed
//! implementation means implementing the same traits.

mod event;
mod event_bus;
mod memory;

pub use event::Event;
pub use event_bus::{BroadcastEventBus, EventBus};
pub use memory::{InMemoryScrapedDataStore, InMemoryStepStore, InMemoryTaskStore};
