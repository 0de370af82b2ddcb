//! Control loop timing

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timing and retry parameters for the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Period between snapshot fetches (ms)
    pub sync_period_ms: u32,
    /// Half-period of the shared blink clock (ms)
    pub blink_half_period_ms: u32,
    /// Countdowns at or below this many seconds blink
    pub urgent_threshold_s: u32,
    /// Length of the blank flash after a color change (ms, 0 disables)
    pub transition_flash_ms: u32,
    /// Reconnect attempts before the link is reported lost
    pub max_reconnect_attempts: u8,
}

impl TimingConfig {
    pub const DEFAULT: Self = Self {
        sync_period_ms: 1000,
        blink_half_period_ms: 500,
        urgent_threshold_s: 5,
        transition_flash_ms: 250,
        max_reconnect_attempts: 10,
    };
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
