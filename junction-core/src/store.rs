//! Last-known-good lane state
//!
//! The store is written once per successful sync cycle and read by the
//! render loop. A snapshot replaces every lane at once; nothing else
//! mutates it.

use crate::lane::{LaneId, LaneState, Snapshot, NUM_LANES};

/// Per-lane result of applying a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LaneChange {
    /// New state now held by the store
    pub state: LaneState,
    /// State the store held before the apply
    pub previous: LaneState,
    /// Signal color changed
    pub transitioned: bool,
}

/// Result of [`LaneStateStore::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChangeSet {
    pub lanes: [LaneChange; NUM_LANES],
}

impl ChangeSet {
    /// Whether the lane's color changed
    pub fn is_transition(&self, lane: LaneId) -> bool {
        self.lanes[lane.index()].transitioned
    }

    /// Lanes whose color changed, in lane order
    pub fn transitions(&self) -> impl Iterator<Item = LaneId> + '_ {
        LaneId::all().filter(|lane| self.is_transition(*lane))
    }

    /// Number of lanes that changed color
    pub fn transition_count(&self) -> usize {
        self.transitions().count()
    }

    pub fn change(&self, lane: LaneId) -> &LaneChange {
        &self.lanes[lane.index()]
    }
}

/// Owned per-lane state cache
#[derive(Debug, Clone, Default)]
pub struct LaneStateStore {
    lanes: [LaneState; NUM_LANES],
    /// Successful applies since startup
    generation: u32,
}

impl LaneStateStore {
    /// Create a store with every lane red and no countdown
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, lane: LaneId) -> LaneState {
        self.lanes[lane.index()]
    }

    /// Replace every lane with the snapshot
    ///
    /// Returns, per lane, the new state and whether the color changed.
    pub fn apply(&mut self, snapshot: Snapshot) -> ChangeSet {
        let mut lanes = [LaneChange {
            state: LaneState::default(),
            previous: LaneState::default(),
            transitioned: false,
        }; NUM_LANES];

        for (i, change) in lanes.iter_mut().enumerate() {
            let previous = self.lanes[i];
            let state = snapshot.lanes[i];
            *change = LaneChange {
                state,
                previous,
                transitioned: previous.color != state.color,
            };
        }

        self.lanes = snapshot.lanes;
        self.generation = self.generation.wrapping_add(1);

        ChangeSet { lanes }
    }

    /// First lane flagged with an emergency, if any
    pub fn emergency_lane(&self) -> Option<LaneId> {
        LaneId::all().find(|lane| self.lanes[lane.index()].emergency)
    }

    /// Number of snapshots applied so far
    pub fn generation(&self) -> u32 {
        self.generation
    }
}
