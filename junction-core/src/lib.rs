//! Board-agnostic control loop for a traffic signal endpoint
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or network implementations:
//!
//! - Lane data model and the last-known-good state store
//! - Sync scheduler (fetch, parse, apply) and link state machine
//! - Blink clock and render loop for the countdown displays
//! - Fault latch for transport and parse failures
//! - Capability traits for actuators, transport and snapshot parsing
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod blink;
pub mod config;
pub mod controller;
pub mod fault;
pub mod lane;
pub mod render;
pub mod store;
pub mod sync;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{Controller, PAYLOAD_BUDGET};
pub use lane::{LaneId, LaneState, SignalColor, Snapshot, NUM_LANES};
pub use render::{DisplayContent, ErrorKind};
pub use store::{ChangeSet, LaneStateStore};
