//! Shared blink clock
//!
//! A free-running square wave used by every lane's display. It advances on
//! elapsed time, not on how often it is polled, so a slow sync cycle never
//! stretches or shortens the blink.

/// Half of the blink square wave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlinkPhase {
    /// Urgent displays are blanked
    On,
    /// Every display shows its digits
    Off,
}

impl BlinkPhase {
    pub fn is_on(self) -> bool {
        matches!(self, BlinkPhase::On)
    }

    fn toggled(self) -> Self {
        match self {
            BlinkPhase::On => BlinkPhase::Off,
            BlinkPhase::Off => BlinkPhase::On,
        }
    }
}

/// Toggle with a fixed half-period
#[derive(Debug, Clone)]
pub struct BlinkClock {
    half_period_ms: u64,
    /// Timestamp of the most recent flip boundary (aligned to the start time)
    last_flip_ms: u64,
    phase: BlinkPhase,
    flips: u64,
}

impl BlinkClock {
    /// Create a clock that starts in [`BlinkPhase::On`] at `start_ms`
    ///
    /// A zero half-period is treated as 1 ms.
    pub fn new(start_ms: u64, half_period_ms: u32) -> Self {
        Self {
            half_period_ms: u64::from(half_period_ms.max(1)),
            last_flip_ms: start_ms,
            phase: BlinkPhase::On,
            flips: 0,
        }
    }

    /// Advance to `now_ms` and return the current phase
    ///
    /// Flips once per whole half-period elapsed since the last boundary.
    /// Timestamps earlier than the last boundary leave the clock unchanged.
    pub fn tick(&mut self, now_ms: u64) -> BlinkPhase {
        if now_ms < self.last_flip_ms {
            return self.phase;
        }

        let periods = (now_ms - self.last_flip_ms) / self.half_period_ms;
        if periods > 0 {
            if periods % 2 == 1 {
                self.phase = self.phase.toggled();
            }
            self.last_flip_ms += periods * self.half_period_ms;
            self.flips = self.flips.saturating_add(periods);
        }

        self.phase
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// Total flips since creation
    pub fn flips(&self) -> u64 {
        self.flips
    }

    pub fn half_period_ms(&self) -> u64 {
        self.half_period_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_on() {
        let mut clock = BlinkClock::new(0, 500);
        assert_eq!(clock.tick(0), BlinkPhase::On);
        assert_eq!(clock.tick(499), BlinkPhase::On);
        assert_eq!(clock.flips(), 0);
    }

    #[test]
    fn test_flips_on_boundaries() {
        let mut clock = BlinkClock::new(0, 500);
        assert_eq!(clock.tick(500), BlinkPhase::Off);
        assert_eq!(clock.tick(999), BlinkPhase::Off);
        assert_eq!(clock.tick(1000), BlinkPhase::On);
        assert_eq!(clock.flips(), 2);
    }

    #[test]
    fn test_catches_up_on_elapsed_time() {
        let mut clock = BlinkClock::new(0, 500);

        // One late poll after a long sync covers three half-periods
        assert_eq!(clock.tick(1700), BlinkPhase::Off);
        assert_eq!(clock.flips(), 3);

        // Boundaries stay aligned to the start time
        assert_eq!(clock.tick(1999), BlinkPhase::Off);
        assert_eq!(clock.tick(2000), BlinkPhase::On);
    }

    #[test]
    fn test_ignores_earlier_timestamp() {
        let mut clock = BlinkClock::new(1000, 500);
        assert_eq!(clock.tick(1600), BlinkPhase::Off);
        assert_eq!(clock.tick(1200), BlinkPhase::Off);
        assert_eq!(clock.flips(), 1);
    }

    #[test]
    fn test_zero_half_period_clamped() {
        let mut clock = BlinkClock::new(0, 0);
        assert_eq!(clock.half_period_ms(), 1);
        clock.tick(3);
        assert_eq!(clock.flips(), 3);
    }

    proptest! {
        #[test]
        fn prop_flips_bounded_by_elapsed(
            half in 1u32..2000,
            steps in proptest::collection::vec(0u64..5000, 1..50),
        ) {
            let start = 10_000u64;
            let mut clock = BlinkClock::new(start, half);
            let mut now = start;
            for step in steps {
                now += step;
                clock.tick(now);
                let bound = (now - start) / u64::from(half);
                prop_assert!(clock.flips() <= bound);
            }
        }

        #[test]
        fn prop_phase_matches_parity(half in 1u32..2000, elapsed in 0u64..1_000_000) {
            let mut clock = BlinkClock::new(0, half);
            let phase = clock.tick(elapsed);
            let flips = elapsed / u64::from(half);
            prop_assert_eq!(phase.is_on(), flips % 2 == 0);
        }
    }
}
