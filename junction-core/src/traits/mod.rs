//! Capability traits
//!
//! These traits define the interface between the control loop and the
//! hardware and network implementations.

pub mod actuator;
pub mod parser;
pub mod transport;

pub use actuator::{ActuatorError, Actuators, ActuatorsExt, DigitDisplay, SignalHead};
pub use parser::{ParseError, SnapshotParser, PARSE_ERROR_CODE};
pub use transport::{codes, Transport, TransportError};
