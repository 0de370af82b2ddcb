//! Snapshot synchronization
//!
//! The sync scheduler pulls a snapshot from the authority on a fixed
//! period, independent of the render cadence. The link state machine
//! tracks connectivity with a bounded number of reconnect attempts.

pub mod link;
pub mod scheduler;

pub use link::{LinkEvent, LinkState};
pub use scheduler::{SyncOutcome, SyncScheduler};
