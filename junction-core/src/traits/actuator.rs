//! Signal head and countdown display traits

use crate::lane::{LaneId, SignalColor};
use crate::render::{DisplayContent, ErrorKind};

/// Errors that can occur when driving an output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// GPIO write failed
    Gpio,
    /// Display bus did not accept the frame
    Bus,
}

/// One three-aspect signal head
///
/// Implementations must never light more than one aspect.
pub trait SignalHead {
    /// Light `color` and extinguish the other two aspects
    fn set(&mut self, color: SignalColor) -> Result<(), ActuatorError>;

    /// Currently lit aspect, `None` before the first successful `set`
    fn color(&self) -> Option<SignalColor>;
}

/// One numeric countdown display
pub trait DigitDisplay {
    fn show(&mut self, content: DisplayContent) -> Result<(), ActuatorError>;
}

/// Lane-indexed access to every output of the junction
pub trait Actuators {
    /// Set the lane's signal head to `color`
    fn set_lane_signal(&mut self, lane: LaneId, color: SignalColor) -> Result<(), ActuatorError>;

    /// Push new content to the lane's countdown display
    fn render_display(&mut self, lane: LaneId, content: DisplayContent)
        -> Result<(), ActuatorError>;
}

/// Convenience wrappers over [`Actuators::render_display`]
pub trait ActuatorsExt: Actuators {
    fn render_digits(&mut self, lane: LaneId, value: u32) -> Result<(), ActuatorError> {
        self.render_display(lane, DisplayContent::Digits(value))
    }

    fn blank(&mut self, lane: LaneId) -> Result<(), ActuatorError> {
        self.render_display(lane, DisplayContent::Blank)
    }

    fn render_error_code(
        &mut self,
        lane: LaneId,
        kind: ErrorKind,
        code: u16,
    ) -> Result<(), ActuatorError> {
        self.render_display(lane, DisplayContent::ErrorCode(kind, code))
    }
}

impl<T: Actuators + ?Sized> ActuatorsExt for T {}
