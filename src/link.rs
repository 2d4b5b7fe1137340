// Byte sources for the receive loop: the serial link and an in-memory replay

use serialport::{self, SerialPort};
use std::collections::VecDeque;
use std::io::Read;
use std::time::Duration;
use tracing::info;

/// Read timeout once the port reports pending bytes
pub const READ_TIMEOUT_MS: u64 = 10;

/// Error types for the controller link
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// Non-blocking, byte-at-a-time input
pub trait ByteSource {
    /// Next received byte, or `None` if nothing is pending right now
    fn poll_byte(&mut self) -> Result<Option<u8>>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        (**self).poll_byte()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        (**self).poll_byte()
    }
}

/// Serial link from the handheld controller
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open a new connection to the controller link
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        info!("Opening controller link on {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl ByteSource for SerialLink {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        if self.port.bytes_to_read()? == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Bytes queued in memory, drained front to back
#[derive(Debug, Default, Clone)]
pub struct MemoryLink {
    pending: VecDeque<u8>,
}

impl MemoryLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl From<&[u8]> for MemoryLink {
    fn from(bytes: &[u8]) -> Self {
        Self {
            pending: bytes.iter().copied().collect(),
        }
    }
}

impl ByteSource for MemoryLink {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.pending.pop_front())
    }
}
