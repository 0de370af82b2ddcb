//! Link state machine
//!
//! Connectivity is explicit state instead of a blocking bootstrap loop.
//! The endpoint starts in `Connecting`, makes one reconnect attempt per
//! sync period, and reports the link lost once the attempt bound is hit.
//! Attempts continue while lost.

/// Network link states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Not yet up; `attempts` failed so far
    Connecting { attempts: u8 },
    /// Link up, snapshots are fetched
    Online,
    /// Attempt bound exhausted; still retrying every period
    Lost,
}

/// Link events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Transport reports the link up
    Connected,
    /// Transport reports the link down
    Disconnected,
    /// A reconnect attempt failed
    AttemptFailed,
}

impl Default for LinkState {
    fn default() -> Self {
        LinkState::Connecting { attempts: 0 }
    }
}

impl LinkState {
    pub fn is_online(&self) -> bool {
        matches!(self, LinkState::Online)
    }

    pub fn is_lost(&self) -> bool {
        matches!(self, LinkState::Lost)
    }

    /// Process an event and return the next state
    ///
    /// `max_attempts` is the number of failed attempts after which the
    /// link is reported lost. Zero is treated as one.
    pub fn transition(self, event: LinkEvent, max_attempts: u8) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (_, Connected) => Online,

            (Online, Disconnected) => Connecting { attempts: 0 },
            (Online, AttemptFailed) => Connecting { attempts: 1 },

            (Connecting { attempts }, AttemptFailed) => {
                let attempts = attempts.saturating_add(1);
                if attempts >= max_attempts.max(1) {
                    Lost
                } else {
                    Connecting { attempts }
                }
            }

            // Default: stay in current state
            _ => self,
        }
    }
}
