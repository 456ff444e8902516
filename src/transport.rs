//! The write-only boundary between the scheduler and the metronome hardware.
//!
//! The wall never talks back: commands are fire-and-forget ASCII lines, and a
//! failed write is a status message, not a reason to stop animating. Keeping
//! this behind a trait lets the scheduler run against a fake in tests and a
//! log sink in simulation.

use log::debug;
use std::fmt::{self, Display};
use std::io;

/// A reliable byte-oriented line writer with flush semantics.
pub trait Transport {
    /// Writes one `\n`-terminated command and flushes it. May block briefly.
    fn send_line(&mut self, line: &str) -> Result<(), TransportError>;
}

/// A transport write or flush failure.
#[derive(Debug)]
pub enum TransportError {
    /// The underlying device write failed.
    Io(io::Error),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(error) => write!(f, "serial write failed: {}", error),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A transport that writes every command to the debug log instead of a
/// device. Used by the simulation mode and the monitor.
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        debug!("wire: {}", line.trim_end());
        Ok(())
    }
}
