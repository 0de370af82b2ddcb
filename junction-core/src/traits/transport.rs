//! Transport trait for pulling snapshots from the authority

/// Display codes for transport failures that carry no HTTP status
pub mod codes {
    /// Link down or lost after bounded reconnect attempts
    pub const LINK_DOWN: u16 = 1;
    /// Request did not complete in time
    pub const TIMEOUT: u16 = 2;
    /// Underlying byte stream failed
    pub const IO: u16 = 3;
    /// Modem or server reply could not be understood
    pub const PROTOCOL: u16 = 4;
    /// Response larger than the payload budget
    pub const OVERFLOW: u16 = 5;
}

/// Errors reported by a [`Transport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No network link
    NotConnected,
    /// Request could not be completed (code from [`codes`])
    RequestFailed(u16),
    /// Server answered with a non-success HTTP status
    Status(u16),
}

impl TransportError {
    /// Code shown on the displays for this failure
    pub fn code(&self) -> u16 {
        match self {
            TransportError::NotConnected => codes::LINK_DOWN,
            TransportError::RequestFailed(code) => *code,
            TransportError::Status(status) => *status,
        }
    }
}

/// Fetches raw snapshot bytes from the authority
///
/// Implementations enforce their own timeouts; the control loop waits for
/// each call to return.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Whether the network link is up
    fn is_connected(&self) -> bool;

    /// Attempt to bring the link up once
    async fn reconnect(&mut self) -> Result<(), TransportError>;

    /// Fetch one snapshot into `buf`, returning the payload length
    ///
    /// A payload that does not fit in `buf` is an error, never truncated.
    async fn fetch_snapshot(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}
