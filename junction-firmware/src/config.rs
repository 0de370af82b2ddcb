//! Node configuration
//!
//! Everything here is compiled in: `node.toml` is validated and turned into
//! constants by the build script, and the Wi-Fi credentials come from the
//! build environment so they never land in the repository.

use junction_core::config::{ChannelMap, LaneChannels, PinConfig, TimingConfig};

include!(concat!(env!("OUT_DIR"), "/node_config.rs"));

/// Access point to join
pub const WIFI_NETWORK: &str = env!("WIFI_NETWORK");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

/// Highest user GPIO on the RP2040
pub const MAX_GPIO: u8 = 29;

/// GPIO0/GPIO1 carry UART0 to the ESP-01
pub const RESERVED_PINS: [u8; 2] = [0, 1];
