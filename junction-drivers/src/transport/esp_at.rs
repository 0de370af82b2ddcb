//! HTTP snapshot transport over an ESP-AT Wi-Fi modem
//!
//! ESP8266/ESP32 modules running Espressif's AT firmware expose a
//! line-oriented command protocol on a UART (115200 8N1 by default):
//! - Commands end in CRLF and are answered by `OK`, `ERROR` or `FAIL`
//! - `AT+CIPSEND=n` answers with a `>` prompt, then takes `n` raw bytes
//! - Received TCP data arrives as `+IPD,n:` followed by `n` raw bytes
//! - `CLOSED` reports the server closed the connection
//!
//! # Fetch sequence
//!
//! 1. `AT+CIPSTART="TCP","host",port`
//! 2. `AT+CIPSEND=len`, wait for `>`, send an HTTP/1.0 GET
//! 3. Collect `+IPD` payloads until `CLOSED`
//! 4. Check the status line and move the body to the front of the buffer
//!
//! HTTP/1.0 with `Connection: close` makes the server close after one
//! response, so the end of the body is the `CLOSED` notification.

use core::fmt::{self, Write as _};

use embedded_io_async::{Read, Write};
use heapless::{String, Vec};
use junction_core::traits::{codes, Transport, TransportError};

/// Longest modem line kept; longer lines are dropped
const LINE_LEN: usize = 96;
/// Longest AT command
const COMMAND_LEN: usize = 192;
/// Longest HTTP request
const REQUEST_LEN: usize = 256;
/// Largest `+IPD` frame the modem emits; anything longer is a corrupt header
const MAX_IPD_LEN: usize = 2920;

/// Connection settings for the modem
#[derive(Debug, Clone, Copy)]
pub struct EspAtConfig<'a> {
    /// Wi-Fi network name
    pub ssid: &'a str,
    /// Wi-Fi passphrase
    pub password: &'a str,
    /// Authority host name or address
    pub host: &'a str,
    /// Authority TCP port
    pub port: u16,
    /// Snapshot path, e.g. `/traffic_data`
    pub path: &'a str,
}

/// Errors from the modem conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EspAtError {
    /// UART failed or closed
    Io,
    /// Modem answered `ERROR` or `FAIL`
    Rejected,
    /// Reply could not be understood
    Malformed,
    /// Command, request or response did not fit its buffer
    Overflow,
    /// Modem reported the Wi-Fi link down
    Disconnected,
    /// Server answered with a non-success HTTP status
    Status(u16),
}

impl From<EspAtError> for TransportError {
    fn from(error: EspAtError) -> Self {
        match error {
            EspAtError::Io => TransportError::RequestFailed(codes::IO),
            EspAtError::Rejected | EspAtError::Malformed => {
                TransportError::RequestFailed(codes::PROTOCOL)
            }
            EspAtError::Overflow => TransportError::RequestFailed(codes::OVERFLOW),
            EspAtError::Disconnected => TransportError::NotConnected,
            EspAtError::Status(status) => TransportError::Status(status),
        }
    }
}

/// Escapes `"`, `,` and `\` for quoted AT parameters
struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            if matches!(c, '"' | ',' | '\\') {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        f.write_char('"')
    }
}

/// Format one command line terminated by CRLF
fn at_line(args: fmt::Arguments<'_>) -> Result<String<COMMAND_LEN>, EspAtError> {
    let mut line = String::new();
    line.write_fmt(args).map_err(|_| EspAtError::Overflow)?;
    line.push_str("\r\n").map_err(|_| EspAtError::Overflow)?;
    Ok(line)
}

/// Parse an unsigned decimal with no sign or padding
fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0usize, |acc, b| {
        if b.is_ascii_digit() {
            acc.checked_mul(10)?.checked_add(usize::from(b - b'0'))
        } else {
            None
        }
    })
}

/// Split a raw HTTP response into status code and body offset
fn split_http(raw: &[u8]) -> Result<(u16, usize), EspAtError> {
    let header_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or(EspAtError::Malformed)?;

    let status_line = raw[..header_end]
        .split(|b| *b == b'\r')
        .next()
        .ok_or(EspAtError::Malformed)?;
    if !status_line.starts_with(b"HTTP/") {
        return Err(EspAtError::Malformed);
    }

    let code = status_line
        .split(|b| *b == b' ')
        .nth(1)
        .and_then(parse_decimal)
        .and_then(|code| u16::try_from(code).ok())
        .ok_or(EspAtError::Malformed)?;

    Ok((code, header_end + 4))
}

/// ESP-AT modem driving HTTP GETs against the authority
pub struct EspAtTransport<'a, U> {
    uart: U,
    config: EspAtConfig<'a>,
    connected: bool,
    line: Vec<u8, LINE_LEN>,
}

impl<'a, U> EspAtTransport<'a, U>
where
    U: Read + Write,
{
    /// Create a transport; the link starts down
    pub fn new(uart: U, config: EspAtConfig<'a>) -> Self {
        Self {
            uart,
            config,
            connected: false,
            line: Vec::new(),
        }
    }

    /// Force a full rejoin on the next cycle
    ///
    /// Used after an aborted request left the modem mid-conversation.
    pub fn drop_link(&mut self) {
        self.connected = false;
    }

    pub fn config(&self) -> &EspAtConfig<'a> {
        &self.config
    }

    pub fn release(self) -> U {
        self.uart
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), EspAtError> {
        self.uart
            .write_all(bytes)
            .await
            .map_err(|_| EspAtError::Io)?;
        self.uart.flush().await.map_err(|_| EspAtError::Io)
    }

    async fn read_byte(&mut self) -> Result<u8, EspAtError> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte).await {
            Ok(1) => Ok(byte[0]),
            _ => Err(EspAtError::Io),
        }
    }

    /// Add a byte to the current line, dropping overlong lines
    fn push_line(&mut self, byte: u8) {
        if self.line.push(byte).is_err() {
            self.line.clear();
        }
    }

    /// Handle a complete line that is not the awaited reply
    fn unsolicited(&mut self) {
        if self.line.as_slice() == b"WIFI DISCONNECT" {
            self.connected = false;
        }
        self.line.clear();
    }

    /// Read lines until `reply`, failing on `ERROR` or `FAIL`
    async fn expect(&mut self, reply: &[u8]) -> Result<(), EspAtError> {
        self.line.clear();
        loop {
            match self.read_byte().await? {
                b'\r' => {}
                b'\n' => {
                    let line = self.line.as_slice();
                    if line == reply {
                        self.line.clear();
                        return Ok(());
                    }
                    if line == b"ERROR" || line == b"FAIL" {
                        self.line.clear();
                        return Err(EspAtError::Rejected);
                    }
                    self.unsolicited();
                }
                byte => self.push_line(byte),
            }
        }
    }

    /// Read until the `>` data prompt
    async fn expect_prompt(&mut self) -> Result<(), EspAtError> {
        self.line.clear();
        loop {
            match self.read_byte().await? {
                b'>' => {
                    self.line.clear();
                    return Ok(());
                }
                b'\r' => {}
                b'\n' => {
                    if self.line.as_slice() == b"ERROR" {
                        self.line.clear();
                        return Err(EspAtError::Rejected);
                    }
                    self.unsolicited();
                }
                byte => self.push_line(byte),
            }
        }
    }

    /// Collect `+IPD` payloads into `buf` until the server closes
    async fn read_response(&mut self, buf: &mut [u8]) -> Result<usize, EspAtError> {
        let mut len: usize = 0;
        let mut overflow = false;
        self.line.clear();

        loop {
            match self.read_byte().await? {
                b'\r' => {}
                b'\n' => {
                    match self.line.as_slice() {
                        b"CLOSED" => break,
                        b"ERROR" => return Err(EspAtError::Rejected),
                        _ => {}
                    }
                    self.unsolicited();
                }
                b':' if self.line.starts_with(b"+IPD,") => {
                    let count = parse_decimal(&self.line[5..])
                        .filter(|count| *count <= MAX_IPD_LEN)
                        .ok_or(EspAtError::Malformed)?;
                    self.line.clear();

                    let end = len.checked_add(count).filter(|end| *end <= buf.len());
                    match end {
                        Some(end) if !overflow => {
                            self.uart
                                .read_exact(&mut buf[len..end])
                                .await
                                .map_err(|_| EspAtError::Io)?;
                            len = end;
                        }
                        _ => {
                            // Drain so the modem stream stays in sync
                            overflow = true;
                            for _ in 0..count {
                                self.read_byte().await?;
                            }
                        }
                    }
                }
                byte => self.push_line(byte),
            }
        }

        if overflow {
            return Err(EspAtError::Overflow);
        }
        Ok(len)
    }

    async fn join(&mut self) -> Result<(), EspAtError> {
        let ssid = self.config.ssid;
        let password = self.config.password;

        for command in ["ATE0", "AT+CWMODE=1", "AT+CIPMUX=0"] {
            let line = at_line(format_args!("{}", command))?;
            self.send(line.as_bytes()).await?;
            self.expect(b"OK").await?;
        }

        let line = at_line(format_args!(
            "AT+CWJAP={},{}",
            Quoted(ssid),
            Quoted(password)
        ))?;
        self.send(line.as_bytes()).await?;
        self.expect(b"OK").await
    }

    async fn fetch(&mut self, buf: &mut [u8]) -> Result<usize, EspAtError> {
        let host = self.config.host;
        let port = self.config.port;
        let path = self.config.path;

        let line = at_line(format_args!("AT+CIPSTART=\"TCP\",{},{}", Quoted(host), port))?;
        self.send(line.as_bytes()).await?;
        let opened = self.expect(b"OK").await;
        if !self.connected {
            // Modem reported the Wi-Fi link down while connecting
            return Err(EspAtError::Disconnected);
        }
        opened?;

        let mut request: String<REQUEST_LEN> = String::new();
        write!(
            request,
            "GET {} HTTP/1.0\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, host
        )
        .map_err(|_| EspAtError::Overflow)?;

        let line = at_line(format_args!("AT+CIPSEND={}", request.len()))?;
        self.send(line.as_bytes()).await?;
        self.expect_prompt().await?;
        self.send(request.as_bytes()).await?;
        self.expect(b"SEND OK").await?;

        let raw = self.read_response(buf).await?;
        let (status, body) = split_http(&buf[..raw])?;
        if !(200..300).contains(&status) {
            return Err(EspAtError::Status(status));
        }

        buf.copy_within(body..raw, 0);
        Ok(raw - body)
    }
}

impl<U> Transport for EspAtTransport<'_, U>
where
    U: Read + Write,
{
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn reconnect(&mut self) -> Result<(), TransportError> {
        match self.join().await {
            Ok(()) => {
                self.connected = true;
                Ok(())
            }
            Err(error) => {
                self.connected = false;
                Err(error.into())
            }
        }
    }

    async fn fetch_snapshot(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        match self.fetch(buf).await {
            Ok(len) => Ok(len),
            Err(error) => {
                if matches!(error, EspAtError::Io | EspAtError::Disconnected) {
                    self.connected = false;
                }
                Err(error.into())
            }
        }
    }
}
