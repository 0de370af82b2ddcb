//! Configuration types
//!
//! Timing parameters and the pin assignment for each lane. Values are
//! produced by the firmware's build-time config loader and validated again
//! at startup before any pin is claimed.

pub mod hardware;
pub mod timing;

pub use hardware::{ChannelMap, ConfigError, LaneChannels, PinConfig};
pub use timing::TimingConfig;
