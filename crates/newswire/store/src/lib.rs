//! Event storage
//!
//! Persists processed events with secondary indices (time, category,
//! source, priority bucket) and a bounded-window retention sweep. The
//! in-memory adapter here is the reference implementation; a durable
//! backend satisfying `EventStore` can replace it.

#![deny(unsafe_code)]

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryEventStore;
pub use traits::{EventQuery, EventStore, StoreStats};
