//! Authority snapshot wire format
//!
//! The authority serves its traffic state as JSON from `/traffic_data`:
//!
//! ```json
//! {
//!   "lane1": {"emergency": false, "remaining_time": 45, "light": "red",
//!             "vehicle_count": 3, "weight": 3.5, "next_state": null},
//!   "lane2": { ... },
//!   "lane3": { ... },
//!   "lane4": { ... }
//! }
//! ```
//!
//! Lane keys are 1-based. A positional array of exactly `NUM_LANES` lane
//! objects is also accepted. Unknown keys are ignored.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

mod json;

pub use json::JsonSnapshotParser;

/// Path of the snapshot endpoint on the authority
pub const SNAPSHOT_PATH: &str = "/traffic_data";
