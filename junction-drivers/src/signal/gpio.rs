//! GPIO signal head
//!
//! Three outputs (directly or via relay/MOSFET), one per aspect. Switching
//! is break-before-make: the two other aspects are released before the
//! target is lit, so two aspects are never lit together.

use embedded_hal::digital::OutputPin;
use junction_core::lane::SignalColor;
use junction_core::traits::{ActuatorError, SignalHead};

/// Three-aspect signal head on GPIO outputs
pub struct GpioSignalHead<P> {
    red: P,
    yellow: P,
    green: P,
    /// If true, aspect lit = pin LOW
    active_low: bool,
    /// Lit aspect, `None` when unknown or all dark
    color: Option<SignalColor>,
}

impl<P: OutputPin> GpioSignalHead<P> {
    /// Create a signal head with every aspect dark
    ///
    /// # Arguments
    /// - `active_low`: If true, an aspect is lit when its pin is LOW
    pub fn new(red: P, yellow: P, green: P, active_low: bool) -> Result<Self, ActuatorError> {
        let mut head = Self {
            red,
            yellow,
            green,
            active_low,
            color: None,
        };
        head.all_dark()?;
        Ok(head)
    }

    /// Extinguish every aspect
    pub fn all_dark(&mut self) -> Result<(), ActuatorError> {
        self.color = None;
        let active_low = self.active_low;
        drive(&mut self.red, false, active_low)?;
        drive(&mut self.yellow, false, active_low)?;
        drive(&mut self.green, false, active_low)
    }

    /// Release the pins
    pub fn release(self) -> (P, P, P) {
        (self.red, self.yellow, self.green)
    }
}

fn drive<P: OutputPin>(pin: &mut P, lit: bool, active_low: bool) -> Result<(), ActuatorError> {
    let result = if lit != active_low {
        pin.set_high()
    } else {
        pin.set_low()
    };
    result.map_err(|_| ActuatorError::Gpio)
}

impl<P: OutputPin> SignalHead for GpioSignalHead<P> {
    fn set(&mut self, color: SignalColor) -> Result<(), ActuatorError> {
        let active_low = self.active_low;
        let (target, others) = match color {
            SignalColor::Red => (&mut self.red, [&mut self.yellow, &mut self.green]),
            SignalColor::Yellow => (&mut self.yellow, [&mut self.red, &mut self.green]),
            SignalColor::Green => (&mut self.green, [&mut self.red, &mut self.yellow]),
        };

        // State is unknown until the target is lit
        self.color = None;

        for pin in others {
            drive(pin, false, active_low)?;
        }
        drive(target, true, active_low)?;

        self.color = Some(color);
        Ok(())
    }

    fn color(&self) -> Option<SignalColor> {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Aspect {
        R,
        Y,
        G,
    }

    /// Shared pin levels plus a write log
    #[derive(Default)]
    struct Board {
        high: [bool; 3],
        log: Vec<(Aspect, bool)>,
        /// Most pins simultaneously lit (active-high) seen so far
        max_lit: usize,
        fail: Option<Aspect>,
    }

    struct MockPin {
        aspect: Aspect,
        board: Rc<RefCell<Board>>,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = embedded_hal::digital::ErrorKind;
    }

    impl MockPin {
        fn write(&mut self, high: bool) -> Result<(), embedded_hal::digital::ErrorKind> {
            let mut board = self.board.borrow_mut();
            if board.fail == Some(self.aspect) {
                return Err(embedded_hal::digital::ErrorKind::Other);
            }
            board.high[self.aspect as usize] = high;
            board.log.push((self.aspect, high));
            let lit = board.high.iter().filter(|h| **h).count();
            board.max_lit = board.max_lit.max(lit);
            Ok(())
        }
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.write(false)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.write(true)
        }
    }

    fn head(active_low: bool) -> (GpioSignalHead<MockPin>, Rc<RefCell<Board>>) {
        let board = Rc::new(RefCell::new(Board::default()));
        let pin = |aspect| MockPin {
            aspect,
            board: board.clone(),
        };
        let head = GpioSignalHead::new(pin(Aspect::R), pin(Aspect::Y), pin(Aspect::G), active_low)
            .unwrap();
        (head, board)
    }

    #[test]
    fn test_starts_dark() {
        let (head, board) = head(false);
        assert_eq!(head.color(), None);
        assert_eq!(board.borrow().high, [false, false, false]);
    }

    #[test]
    fn test_exactly_one_lit() {
        let (mut head, board) = head(false);

        for color in [SignalColor::Green, SignalColor::Yellow, SignalColor::Red] {
            head.set(color).unwrap();
            let lit = board.borrow().high.iter().filter(|h| **h).count();
            assert_eq!(lit, 1);
            assert_eq!(head.color(), Some(color));
        }

        // Never two at once, even mid-switch
        assert_eq!(board.borrow().max_lit, 1);
    }

    #[test]
    fn test_break_before_make() {
        let (mut head, board) = head(false);
        head.set(SignalColor::Green).unwrap();
        board.borrow_mut().log.clear();

        head.set(SignalColor::Yellow).unwrap();

        let log = board.borrow().log.clone();
        assert_eq!(log.last(), Some(&(Aspect::Y, true)));
        assert!(log[..log.len() - 1].iter().all(|(_, high)| !high));
    }

    #[test]
    fn test_active_low() {
        let (mut head, board) = head(true);

        // Dark = all pins high for active-low
        assert_eq!(board.borrow().high, [true, true, true]);

        head.set(SignalColor::Red).unwrap();
        assert_eq!(board.borrow().high, [false, true, true]);
    }

    #[test]
    fn test_failed_write_leaves_color_unknown() {
        let (mut head, board) = head(false);
        head.set(SignalColor::Red).unwrap();

        board.borrow_mut().fail = Some(Aspect::G);
        assert_eq!(head.set(SignalColor::Green), Err(ActuatorError::Gpio));
        assert_eq!(head.color(), None);
    }
}
