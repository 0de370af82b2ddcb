//! Lane bank
//!
//! Groups one signal head and one countdown display per lane behind the
//! lane-indexed [`Actuators`] capability.

use junction_core::lane::{LaneId, SignalColor, NUM_LANES};
use junction_core::render::DisplayContent;
use junction_core::traits::{ActuatorError, Actuators, DigitDisplay, SignalHead};

pub struct LaneBank<S, D> {
    heads: [S; NUM_LANES],
    displays: [D; NUM_LANES],
}

impl<S, D> LaneBank<S, D>
where
    S: SignalHead,
    D: DigitDisplay,
{
    pub fn new(heads: [S; NUM_LANES], displays: [D; NUM_LANES]) -> Self {
        Self { heads, displays }
    }

    pub fn head(&self, lane: LaneId) -> &S {
        &self.heads[lane.index()]
    }

    pub fn display(&self, lane: LaneId) -> &D {
        &self.displays[lane.index()]
    }
}

impl<S, D> Actuators for LaneBank<S, D>
where
    S: SignalHead,
    D: DigitDisplay,
{
    fn set_lane_signal(&mut self, lane: LaneId, color: SignalColor) -> Result<(), ActuatorError> {
        self.heads[lane.index()].set(color)
    }

    fn render_display(
        &mut self,
        lane: LaneId,
        content: DisplayContent,
    ) -> Result<(), ActuatorError> {
        self.displays[lane.index()].show(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::render::ErrorKind;
    use junction_core::traits::ActuatorsExt;

    #[derive(Default)]
    struct Head(Option<SignalColor>);

    impl SignalHead for Head {
        fn set(&mut self, color: SignalColor) -> Result<(), ActuatorError> {
            self.0 = Some(color);
            Ok(())
        }

        fn color(&self) -> Option<SignalColor> {
            self.0
        }
    }

    #[derive(Default)]
    struct Display(Option<DisplayContent>);

    impl DigitDisplay for Display {
        fn show(&mut self, content: DisplayContent) -> Result<(), ActuatorError> {
            self.0 = Some(content);
            Ok(())
        }
    }

    #[test]
    fn test_routes_by_lane() {
        let mut bank = LaneBank::new(
            core::array::from_fn(|_| Head::default()),
            core::array::from_fn(|_| Display::default()),
        );
        let lane2 = LaneId::new(2).unwrap();

        bank.set_lane_signal(lane2, SignalColor::Green).unwrap();
        bank.render_digits(lane2, 17).unwrap();

        assert_eq!(bank.head(lane2).color(), Some(SignalColor::Green));
        assert_eq!(bank.display(lane2).0, Some(DisplayContent::Digits(17)));
        assert_eq!(bank.head(LaneId::new(0).unwrap()).color(), None);

        bank.blank(lane2).unwrap();
        assert_eq!(bank.display(lane2).0, Some(DisplayContent::Blank));

        bank.render_error_code(lane2, ErrorKind::Transport, 404).unwrap();
        assert_eq!(
            bank.display(lane2).0,
            Some(DisplayContent::ErrorCode(ErrorKind::Transport, 404))
        );
        assert_eq!(bank.display(LaneId::new(3).unwrap()).0, None);
    }
}
