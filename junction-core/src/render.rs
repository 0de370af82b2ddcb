//! Countdown display rendering
//!
//! Every main-loop iteration the render loop decides, per lane, what the
//! countdown display should show. Priority:
//!
//! 1. Latched fault: error code on every lane
//! 2. Transition flash: blank for a short window after a color change
//! 3. Urgent blink: blank while the blink phase is on
//! 4. Remaining seconds
//!
//! Only changed content is pushed to the actuators.

use crate::blink::BlinkPhase;
use crate::lane::{LaneId, LaneState, SignalColor, NUM_LANES};
use crate::traits::{ActuatorError, Actuators};

/// Class of fault shown on a display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    Transport,
    Parse,
}

/// What a countdown display shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayContent {
    /// Decimal countdown value
    Digits(u32),
    /// Fault code with a visual marker distinguishing it from a countdown
    ErrorCode(ErrorKind, u16),
    /// All segments off
    Blank,
}

/// Whether a lane is in its blinking state
///
/// A lane is urgent when its countdown is at or below the threshold or
/// its signal is yellow.
pub fn is_urgent(state: &LaneState, threshold_s: u32) -> bool {
    state.remaining_s <= threshold_s || state.color == SignalColor::Yellow
}

/// Decide the display content for one lane
pub fn display_content(
    state: &LaneState,
    phase: BlinkPhase,
    fault: Option<(ErrorKind, u16)>,
    flashing: bool,
    urgent_threshold_s: u32,
) -> DisplayContent {
    if let Some((kind, code)) = fault {
        return DisplayContent::ErrorCode(kind, code);
    }
    if flashing {
        return DisplayContent::Blank;
    }
    if is_urgent(state, urgent_threshold_s) && phase.is_on() {
        return DisplayContent::Blank;
    }
    DisplayContent::Digits(state.remaining_s)
}

/// Per-lane display cache and transition flash timers
#[derive(Debug, Clone)]
pub struct RenderLoop {
    urgent_threshold_s: u32,
    flash_ms: u32,
    /// Content last accepted by each display
    shown: [Option<DisplayContent>; NUM_LANES],
    /// End of the transition flash for each lane
    flash_until: [Option<u64>; NUM_LANES],
}

impl RenderLoop {
    pub fn new(urgent_threshold_s: u32, flash_ms: u32) -> Self {
        Self {
            urgent_threshold_s,
            flash_ms,
            shown: [None; NUM_LANES],
            flash_until: [None; NUM_LANES],
        }
    }

    /// Start the one-shot transition flash for a lane
    ///
    /// Restarting an active flash extends it; it still ends once.
    pub fn trigger_flash(&mut self, lane: LaneId, now_ms: u64) {
        if self.flash_ms > 0 {
            self.flash_until[lane.index()] = Some(now_ms + u64::from(self.flash_ms));
        }
    }

    /// Whether the lane's transition flash is still running
    pub fn is_flashing(&self, lane: LaneId, now_ms: u64) -> bool {
        matches!(self.flash_until[lane.index()], Some(until) if now_ms < until)
    }

    /// Content last pushed successfully to the lane's display
    pub fn shown(&self, lane: LaneId) -> Option<DisplayContent> {
        self.shown[lane.index()]
    }

    /// Forget cached content so the next pass re-sends every display
    pub fn invalidate(&mut self) {
        self.shown = [None; NUM_LANES];
    }

    /// Run one render pass over every lane
    ///
    /// `state` supplies each lane's stored state. Displays whose content is
    /// unchanged are not touched. A failed write leaves the cache stale so
    /// the next pass retries; the first error is returned after every lane
    /// has been attempted.
    pub fn render<A, F>(
        &mut self,
        now_ms: u64,
        phase: BlinkPhase,
        fault: Option<(ErrorKind, u16)>,
        state: F,
        actuators: &mut A,
    ) -> Result<(), ActuatorError>
    where
        A: Actuators + ?Sized,
        F: Fn(LaneId) -> LaneState,
    {
        let mut result = Ok(());

        for lane in LaneId::all() {
            let i = lane.index();

            if let Some(until) = self.flash_until[i] {
                if now_ms >= until {
                    self.flash_until[i] = None;
                }
            }

            let content = display_content(
                &state(lane),
                phase,
                fault,
                self.flash_until[i].is_some(),
                self.urgent_threshold_s,
            );

            if self.shown[i] == Some(content) {
                continue;
            }

            match actuators.render_display(lane, content) {
                Ok(()) => self.shown[i] = Some(content),
                Err(e) => {
                    self.shown[i] = None;
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }

        result
    }
}
