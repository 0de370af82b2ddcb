//! TM1637 four-digit seven-segment display
//!
//! The TM1637 uses a two-wire serial protocol that looks like I2C but has
//! no addressing and sends bytes LSB first:
//! - Start: DIO falls while CLK is high
//! - Data: DIO is sampled on each CLK rising edge, 8 bits then an ACK slot
//! - Stop: DIO rises while CLK is high
//!
//! Both lines are driven as push-pull outputs. The ACK bit is clocked but
//! not read.
//!
//! # Rendering
//!
//! - Countdown: right-aligned, no leading zeros, clamped to 9999
//! - Error code: kind letter (`E` transport, `P` parse), three zero-padded
//!   digits and the colon lit
//! - Blank: all segments off

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use junction_core::render::{DisplayContent, ErrorKind};
use junction_core::traits::{ActuatorError, DigitDisplay};

/// TM1637 commands
pub mod cmd {
    /// Data command: write, auto-increment address
    pub const DATA_AUTO_INCREMENT: u8 = 0x40;
    /// Address command for digit 0
    pub const ADDRESS_BASE: u8 = 0xC0;
    /// Display control: display on, OR with brightness 0-7
    pub const DISPLAY_ON: u8 = 0x88;
}

/// Segment patterns for 0-9 (bit 0 = segment a)
pub const DIGITS: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];

/// Letter `E`
pub const GLYPH_E: u8 = 0x79;
/// Letter `P`
pub const GLYPH_P: u8 = 0x73;
/// Colon, on the second digit
pub const COLON: u8 = 0x80;

/// Half clock period in microseconds
const BIT_DELAY_US: u32 = 5;

/// Largest countdown that fits
pub const MAX_VALUE: u32 = 9999;

/// Segment bytes for a display content
pub fn encode(content: DisplayContent) -> [u8; 4] {
    match content {
        DisplayContent::Blank => [0; 4],
        DisplayContent::Digits(value) => {
            let mut value = value.min(MAX_VALUE);
            let mut segments = [0u8; 4];
            // Leading positions stay dark
            for slot in segments.iter_mut().rev() {
                *slot = DIGITS[(value % 10) as usize];
                value /= 10;
                if value == 0 {
                    break;
                }
            }
            segments
        }
        DisplayContent::ErrorCode(kind, code) => {
            let code = code.min(999);
            let letter = match kind {
                ErrorKind::Transport => GLYPH_E,
                ErrorKind::Parse => GLYPH_P,
            };
            [
                letter,
                DIGITS[(code / 100) as usize] | COLON,
                DIGITS[(code / 10 % 10) as usize],
                DIGITS[(code % 10) as usize],
            ]
        }
    }
}

/// Bit-banged TM1637 driver
pub struct Tm1637<CLK, DIO, D> {
    clk: CLK,
    dio: DIO,
    delay: D,
    /// Brightness 0-7
    brightness: u8,
}

impl<CLK, DIO, D> Tm1637<CLK, DIO, D>
where
    CLK: OutputPin,
    DIO: OutputPin,
    D: DelayNs,
{
    /// Create a driver with both lines idle (high)
    pub fn new(clk: CLK, dio: DIO, delay: D) -> Result<Self, ActuatorError> {
        let mut display = Self {
            clk,
            dio,
            delay,
            brightness: 7,
        };
        display.clk_high()?;
        display.dio_high()?;
        Ok(display)
    }

    /// Set brightness (0-7, clamped); takes effect on the next write
    pub fn set_brightness(&mut self, level: u8) {
        self.brightness = level.min(7);
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Write four raw segment bytes
    pub fn write_segments(&mut self, segments: [u8; 4]) -> Result<(), ActuatorError> {
        self.start()?;
        self.write_byte(cmd::DATA_AUTO_INCREMENT)?;
        self.stop()?;

        self.start()?;
        self.write_byte(cmd::ADDRESS_BASE)?;
        for byte in segments {
            self.write_byte(byte)?;
        }
        self.stop()?;

        self.start()?;
        self.write_byte(cmd::DISPLAY_ON | self.brightness)?;
        self.stop()
    }

    fn start(&mut self) -> Result<(), ActuatorError> {
        self.clk_high()?;
        self.dio_high()?;
        self.bit_delay();
        self.dio_low()?;
        self.bit_delay();
        self.clk_low()
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        self.clk_low()?;
        self.dio_low()?;
        self.bit_delay();
        self.clk_high()?;
        self.bit_delay();
        self.dio_high()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ActuatorError> {
        for bit in 0..8 {
            self.clk_low()?;
            if byte & (1 << bit) != 0 {
                self.dio_high()?;
            } else {
                self.dio_low()?;
            }
            self.bit_delay();
            self.clk_high()?;
            self.bit_delay();
        }

        // ACK slot
        self.clk_low()?;
        self.dio_high()?;
        self.bit_delay();
        self.clk_high()?;
        self.bit_delay();
        self.clk_low()
    }

    fn bit_delay(&mut self) {
        self.delay.delay_us(BIT_DELAY_US);
    }

    fn clk_high(&mut self) -> Result<(), ActuatorError> {
        self.clk.set_high().map_err(|_| ActuatorError::Bus)
    }

    fn clk_low(&mut self) -> Result<(), ActuatorError> {
        self.clk.set_low().map_err(|_| ActuatorError::Bus)
    }

    fn dio_high(&mut self) -> Result<(), ActuatorError> {
        self.dio.set_high().map_err(|_| ActuatorError::Bus)
    }

    fn dio_low(&mut self) -> Result<(), ActuatorError> {
        self.dio.set_low().map_err(|_| ActuatorError::Bus)
    }
}

impl<CLK, DIO, D> DigitDisplay for Tm1637<CLK, DIO, D>
where
    CLK: OutputPin,
    DIO: OutputPin,
    D: DelayNs,
{
    fn show(&mut self, content: DisplayContent) -> Result<(), ActuatorError> {
        self.write_segments(encode(content))
    }
}
