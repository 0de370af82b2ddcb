//! Fault latch
//!
//! Remembers the most recent sync failure so every display keeps showing
//! its error code between cycles. A successful apply clears it.

use crate::render::ErrorKind;
use crate::traits::{ParseError, TransportError, PARSE_ERROR_CODE};

/// Fault currently shown on the displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayFault {
    /// Transport failure with its display code
    Transport(u16),
    /// Payload did not parse
    Parse,
}

impl DisplayFault {
    /// Error class and code for the displays
    pub fn content(&self) -> (ErrorKind, u16) {
        match self {
            DisplayFault::Transport(code) => (ErrorKind::Transport, *code),
            DisplayFault::Parse => (ErrorKind::Parse, PARSE_ERROR_CODE),
        }
    }
}

/// Tracks sync failures for display and logging
#[derive(Debug, Clone, Default)]
pub struct FaultLatch {
    active: Option<DisplayFault>,
    /// Failed cycles since the last successful apply
    consecutive: u32,
    /// Failed cycles since startup
    total: u32,
}

impl FaultLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transport(&mut self, error: TransportError) {
        self.latch(DisplayFault::Transport(error.code()));
    }

    pub fn record_parse(&mut self, _error: &ParseError) {
        self.latch(DisplayFault::Parse);
    }

    fn latch(&mut self, fault: DisplayFault) {
        self.active = Some(fault);
        self.consecutive = self.consecutive.saturating_add(1);
        self.total = self.total.saturating_add(1);
    }

    /// Successful apply: displays return to countdowns
    pub fn clear(&mut self) {
        self.active = None;
        self.consecutive = 0;
    }

    pub fn active(&self) -> Option<DisplayFault> {
        self.active
    }

    /// Error class and code every display should show, if any
    pub fn display_fault(&self) -> Option<(ErrorKind, u16)> {
        self.active.map(|fault| fault.content())
    }

    pub fn is_faulted(&self) -> bool {
        self.active.is_some()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    pub fn total_failures(&self) -> u32 {
        self.total
    }
}
