//! Signal head drivers

pub mod gpio;

pub use gpio::GpioSignalHead;
