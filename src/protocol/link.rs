use derive_more::{Display, Error};
use std::{
    io::{self, BufRead, BufReader, Read, Write},
    time::Duration,
};

use serialport::{DataBits, Parity, StopBits};

use crate::{
    core::telemetry::TelemetryFrame,
    protocol::acquisition::{self, AcquisitionLimits},
};

/// Serial parameters used for every exchange. Framing is fixed at 8N1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud: u32,
    pub read_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud: 9600,
            read_timeout: Duration::from_secs(2),
        }
    }
}

impl LinkSettings {
    fn builder(&self, port: &str) -> serialport::SerialPortBuilder {
        serialport::new(port, self.baud)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .timeout(self.read_timeout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    Open,
    Write,
    Read,
    Timeout,
    Decode,
}

/// Any transport failure during an exchange, already rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{message}")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub message: String,
}

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn from_io(kind: DeviceErrorKind, port: &str, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::TimedOut {
            return Self::new(
                DeviceErrorKind::Timeout,
                format!("timed out waiting for {port}"),
            );
        }
        let verb = match kind {
            DeviceErrorKind::Open => "open",
            DeviceErrorKind::Write => "write to",
            _ => "read from",
        };
        Self::new(kind, format!("failed to {verb} {port}: {err}"))
    }
}

/// Byte stream of one open connection.
pub trait Connection: Read + Write + Send {}

impl<T: Read + Write + Send> Connection for T {}

/// Opens connections by port name. Swapped for an in-memory fake in tests.
pub trait Opener: Send + Sync {
    fn open(&self, port: &str, settings: &LinkSettings) -> Result<Box<dyn Connection>, DeviceError>;
}

/// `serialport`-backed opener used by the console.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialOpener;

impl Opener for SerialOpener {
    fn open(&self, port: &str, settings: &LinkSettings) -> Result<Box<dyn Connection>, DeviceError> {
        let handle = settings.builder(port).open().map_err(|err| {
            DeviceError::new(DeviceErrorKind::Open, format!("failed to open {port}: {err}"))
        })?;
        log::debug!("opened {port} at {} baud", settings.baud);
        Ok(Box::new(handle))
    }
}

/// One-shot command channel to the bench controller.
///
/// Every call opens the port, performs its exchange and drops the connection
/// before returning, so no handle outlives an invocation.
pub struct DeviceLink<O: Opener> {
    opener: O,
    settings: LinkSettings,
}

impl<O: Opener> DeviceLink<O> {
    pub fn new(opener: O, settings: LinkSettings) -> Self {
        Self { opener, settings }
    }

    /// Write `command` verbatim and return the first response line, trimmed.
    pub fn exchange(&self, port: &str, command: &[u8]) -> Result<String, DeviceError> {
        let mut reader = self.send(port, command)?;
        read_response(&mut reader, port)
    }

    /// Like [`exchange`](Self::exchange), but when the device acknowledges the
    /// command the same connection keeps streaming samples until the end marker,
    /// a read timeout or `limits.max_samples`.
    pub fn exchange_and_acquire(
        &self,
        port: &str,
        command: &[u8],
        limits: &AcquisitionLimits,
    ) -> Result<(String, Option<TelemetryFrame>), DeviceError> {
        let mut reader = self.send(port, command)?;
        let response = read_response(&mut reader, port)?;
        if response != crate::protocol::command::ACK {
            return Ok((response, None));
        }
        let frame = acquisition::collect(&mut reader, port, limits)?;
        Ok((response, Some(frame)))
    }

    fn send(&self, port: &str, command: &[u8]) -> Result<BufReader<Box<dyn Connection>>, DeviceError> {
        let mut conn = self.opener.open(port, &self.settings)?;
        conn.write_all(command)
            .and_then(|_| conn.flush())
            .map_err(|err| DeviceError::from_io(DeviceErrorKind::Write, port, &err))?;
        log::debug!(
            "[{port}] sent {:?}",
            String::from_utf8_lossy(command).trim_end()
        );
        Ok(BufReader::new(conn))
    }
}

/// Read bytes up to and including the next `\n`; returns how many were read.
pub(crate) fn read_raw_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    buf.clear();
    reader.read_until(b'\n', buf)
}

pub(crate) fn decode_line(buf: &[u8], port: &str) -> Result<String, DeviceError> {
    std::str::from_utf8(buf)
        .map(|text| text.trim().to_string())
        .map_err(|err| {
            DeviceError::new(
                DeviceErrorKind::Decode,
                format!("undecodable response from {port}: {err}"),
            )
        })
}

fn read_response<R: BufRead>(reader: &mut R, port: &str) -> Result<String, DeviceError> {
    let mut buf = Vec::with_capacity(16);
    read_raw_line(reader, &mut buf)
        .map_err(|err| DeviceError::from_io(DeviceErrorKind::Read, port, &err))?;
    let response = decode_line(&buf, port)?;
    log::debug!("[{port}] received {response:?}");
    Ok(response)
}
