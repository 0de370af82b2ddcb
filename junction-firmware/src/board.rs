//! Lane outputs on RP2040 GPIO
//!
//! Builds the signal heads and countdown displays from pins claimed in
//! lane order. Pin numbers and polarity come from the compiled-in
//! [`CHANNEL_MAP`].

use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_rp::Peri;
use embassy_time::Delay;

use junction_core::config::LaneChannels;
use junction_core::lane::NUM_LANES;
use junction_core::traits::ActuatorError;
use junction_drivers::{GpioSignalHead, LaneBank, Tm1637};

use crate::config::CHANNEL_MAP;

pub type SignalHeadPins = GpioSignalHead<Output<'static>>;
pub type CountdownDisplay = Tm1637<Output<'static>, Output<'static>, Delay>;
pub type Bank = LaneBank<SignalHeadPins, CountdownDisplay>;

/// Red, yellow, green, display CLK, display DIO
pub type LanePins = [Peri<'static, AnyPin>; 5];

/// TM1637 brightness (0-7)
const DISPLAY_BRIGHTNESS: u8 = 4;

pub fn build_bank(pins: [LanePins; NUM_LANES]) -> Result<Bank, ActuatorError> {
    let [lane1, lane2, lane3, lane4] = pins;

    let (head1, display1) = build_lane(lane1, &CHANNEL_MAP.lanes[0])?;
    let (head2, display2) = build_lane(lane2, &CHANNEL_MAP.lanes[1])?;
    let (head3, display3) = build_lane(lane3, &CHANNEL_MAP.lanes[2])?;
    let (head4, display4) = build_lane(lane4, &CHANNEL_MAP.lanes[3])?;

    Ok(LaneBank::new(
        [head1, head2, head3, head4],
        [display1, display2, display3, display4],
    ))
}

fn build_lane(
    pins: LanePins,
    channels: &LaneChannels,
) -> Result<(SignalHeadPins, CountdownDisplay), ActuatorError> {
    let active_low = channels.signal_active_low();
    let [red, yellow, green, clk, dio] = pins;

    // Outputs come up dark; no aspect may glow before the head owns them
    let dark = if active_low { Level::High } else { Level::Low };
    let head = GpioSignalHead::new(
        Output::new(red, dark),
        Output::new(yellow, dark),
        Output::new(green, dark),
        active_low,
    )?;

    let mut display = Tm1637::new(
        Output::new(clk, Level::High),
        Output::new(dio, Level::High),
        Delay,
    )?;
    display.set_brightness(DISPLAY_BRIGHTNESS);

    Ok((head, display))
}
