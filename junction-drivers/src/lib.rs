//! Hardware and network driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in junction-core:
//!
//! - Signal heads on three GPIO outputs
//! - TM1637 four-digit countdown displays (bit-banged)
//! - Lane bank adapting heads and displays to the lane-indexed actuators
//! - HTTP snapshot transport over an ESP-AT Wi-Fi modem

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bank;
pub mod display;
pub mod signal;
pub mod transport;

pub use bank::LaneBank;
pub use display::Tm1637;
pub use signal::GpioSignalHead;
pub use transport::{EspAtConfig, EspAtError, EspAtTransport};
