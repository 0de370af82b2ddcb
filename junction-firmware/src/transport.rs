//! Deadline-bounded modem transport
//!
//! The ESP-AT driver waits for replies indefinitely. This wrapper puts a
//! deadline on every join and fetch so a wedged modem costs one sync cycle,
//! not the whole control loop. A timed-out request forces a full rejoin.

use embassy_time::{with_timeout, Duration};
use embedded_io_async::{Read, Write};

use junction_core::traits::{codes, Transport, TransportError};
use junction_drivers::EspAtTransport;

/// Deadline for joining the access point
pub const JOIN_TIMEOUT_MS: u64 = 15_000;

/// Deadline for one HTTP GET, kept under the sync period
pub const FETCH_TIMEOUT_MS: u64 = 800;

pub struct TimedTransport<U> {
    inner: EspAtTransport<'static, U>,
    join_timeout: Duration,
    fetch_timeout: Duration,
}

impl<U> TimedTransport<U>
where
    U: Read + Write,
{
    pub fn new(inner: EspAtTransport<'static, U>) -> Self {
        Self {
            inner,
            join_timeout: Duration::from_millis(JOIN_TIMEOUT_MS),
            fetch_timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
        }
    }

    fn timed_out(&mut self) -> TransportError {
        self.inner.drop_link();
        TransportError::RequestFailed(codes::TIMEOUT)
    }
}

impl<U> Transport for TimedTransport<U>
where
    U: Read + Write,
{
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn reconnect(&mut self) -> Result<(), TransportError> {
        match with_timeout(self.join_timeout, self.inner.reconnect()).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out()),
        }
    }

    async fn fetch_snapshot(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match with_timeout(self.fetch_timeout, self.inner.fetch_snapshot(buf)).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out()),
        }
    }
}
