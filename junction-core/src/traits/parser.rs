//! Snapshot parser trait

use core::fmt::{self, Write};

use heapless::String;

use crate::lane::Snapshot;

/// Code shown on every display when a payload fails to parse
pub const PARSE_ERROR_CODE: u16 = 999;

/// Maximum diagnostic length kept in a [`ParseError`]
pub const MAX_DIAGNOSTIC_LEN: usize = 64;

/// Malformed or incomplete payload
///
/// Carries a short human-readable diagnostic, truncated to fit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    message: String<MAX_DIAGNOSTIC_LEN>,
}

impl ParseError {
    pub fn new(message: &str) -> Self {
        Self::from_fmt(format_args!("{}", message))
    }

    /// Build a diagnostic from format arguments
    pub fn from_fmt(args: fmt::Arguments<'_>) -> Self {
        let mut writer = Truncating(String::new());
        // Err only marks the point where the message was cut
        let _ = writer.write_fmt(args);
        Self { message: writer.0 }
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Display code for parse failures
    pub fn code(&self) -> u16 {
        PARSE_ERROR_CODE
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Writer that keeps the longest prefix that fits
///
/// The first rejected char ends the message, so later shorter
/// segments are never appended after a gap.
struct Truncating<const N: usize>(String<N>);

impl<const N: usize> Write for Truncating<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            self.0.push(c).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

/// Turns raw payload bytes into a [`Snapshot`]
///
/// Parsing is all-or-nothing: a payload missing any lane or field fails
/// as a whole.
pub trait SnapshotParser {
    fn parse(&self, payload: &[u8]) -> Result<Snapshot, ParseError>;
}

impl<F> SnapshotParser for F
where
    F: Fn(&[u8]) -> Result<Snapshot, ParseError>,
{
    fn parse(&self, payload: &[u8]) -> Result<Snapshot, ParseError> {
        self(payload)
    }
}
