//! Lane data model
//!
//! A junction has a fixed number of lanes, each with one signal head and
//! one countdown display. Everything is indexed by [`LaneId`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of lanes served by one endpoint
pub const NUM_LANES: usize = 4;

/// Lane index in `0..NUM_LANES`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LaneId(u8);

impl LaneId {
    /// Create a lane id, or `None` if out of range
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_LANES {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Zero-based index into per-lane arrays
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over every lane in order
    pub fn all() -> impl Iterator<Item = LaneId> {
        (0..NUM_LANES as u8).map(LaneId)
    }
}

/// Active aspect of a signal head
///
/// Exactly one is lit per lane at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SignalColor {
    #[default]
    Red,
    Yellow,
    Green,
}

impl SignalColor {
    /// Decode from the first character of a color name
    ///
    /// `"red"`, `"Red"` and `"r"` all decode to [`SignalColor::Red`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.as_bytes().first()?.to_ascii_lowercase() {
            b'r' => Some(SignalColor::Red),
            b'y' => Some(SignalColor::Yellow),
            b'g' => Some(SignalColor::Green),
            _ => None,
        }
    }
}

/// Last-known state of one lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneState {
    /// Active signal aspect
    pub color: SignalColor,
    /// Seconds until the next phase change
    pub remaining_s: u32,
    /// Authority has an emergency vehicle on this lane
    pub emergency: bool,
    /// Vehicles counted by the authority (informational)
    pub vehicle_count: u32,
    /// Weighted traffic load (informational, truncated to whole units)
    pub weight: u32,
}

impl LaneState {
    /// Create a state with only color and countdown set
    pub const fn new(color: SignalColor, remaining_s: u32) -> Self {
        Self {
            color,
            remaining_s,
            emergency: false,
            vehicle_count: 0,
            weight: 0,
        }
    }
}

/// One complete update from the authority, one entry per lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub lanes: [LaneState; NUM_LANES],
}

impl Snapshot {
    pub const fn new(lanes: [LaneState; NUM_LANES]) -> Self {
        Self { lanes }
    }

    pub fn lane(&self, lane: LaneId) -> &LaneState {
        &self.lanes[lane.index()]
    }
}
