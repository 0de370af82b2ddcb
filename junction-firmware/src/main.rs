//! Junction - Traffic Signal Endpoint Firmware
//!
//! Main firmware binary for RP2040 boards with an ESP-01 Wi-Fi modem.
//! Pulls the lane snapshot from the authority once per sync period and
//! drives four signal heads and four TM1637 countdown displays.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Duration, Instant, Ticker, Timer};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use junction_core::sync::SyncOutcome;
use junction_core::Controller;
use junction_drivers::{EspAtConfig, EspAtTransport};
use junction_protocol::JsonSnapshotParser;

use crate::transport::TimedTransport;

#[macro_use]
mod config;
mod board;
mod transport;

// Heap allocator for JSON decoding
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

/// Main loop period; bounds blink and flash timing jitter
const POLL_INTERVAL_MS: u64 = 20;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
// Large enough to hold a whole +IPD burst from the modem
static RX_BUF: StaticCell<[u8; 1536]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Junction firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Checked again before any pin is claimed
    if let Err(e) = config::CHANNEL_MAP.validate(config::MAX_GPIO, &config::RESERVED_PINS) {
        error!("Invalid pin assignment: {}", e);
        halt().await;
    }

    // ESP-01 on UART0, 115200 baud default
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 1536]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    let modem = EspAtTransport::new(
        uart,
        EspAtConfig {
            ssid: config::WIFI_NETWORK,
            password: config::WIFI_PASSWORD,
            host: config::AUTHORITY_HOST,
            port: config::AUTHORITY_PORT,
            path: config::AUTHORITY_PATH,
        },
    );
    info!("Modem UART initialized");

    let bank = match board::build_bank(take_lane_pins!(p)) {
        Ok(bank) => bank,
        Err(e) => {
            error!("Failed to initialize lane outputs: {}", e);
            halt().await
        }
    };
    info!("Lane outputs initialized");

    let mut controller = Controller::new(
        config::TIMING,
        TimedTransport::new(modem),
        JsonSnapshotParser::new(),
        bank,
    );

    let start = Instant::now();
    controller.start(0);
    info!(
        "Controller running, authority {}:{}{}",
        config::AUTHORITY_HOST,
        config::AUTHORITY_PORT,
        config::AUTHORITY_PATH
    );

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));

    loop {
        let now_ms = start.elapsed().as_millis();

        if let Some(outcome) = controller.poll(now_ms).await {
            log_outcome(&outcome);
            if outcome.is_applied() {
                if let Some(lane) = controller.store().emergency_lane() {
                    debug!("Emergency vehicle on lane{}", lane.index() + 1);
                }
            }
        }

        if let Some(e) = controller.take_actuator_error() {
            warn!("Actuator write failed, retrying: {}", e);
        }

        ticker.next().await;
    }
}

fn log_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Applied(changes) => {
            for lane in changes.transitions() {
                info!(
                    "lane{} -> {}",
                    lane.index() + 1,
                    changes.change(lane).state.color
                );
            }
            trace!("Snapshot applied");
        }
        SyncOutcome::Reconnected => info!("Joined access point"),
        SyncOutcome::Reconnecting { attempts, error } => {
            warn!("Join attempt {} failed: {}", attempts, error)
        }
        SyncOutcome::LinkLost(error) => error!("Link lost: {}", error),
        SyncOutcome::TransportFailed(error) => warn!("Fetch failed: {}", error),
        SyncOutcome::ParseFailed(error) => warn!("Bad snapshot: {}", error.message()),
    }
}

/// Park forever after an unrecoverable startup error
async fn halt() -> ! {
    loop {
        Timer::after_secs(60).await;
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
