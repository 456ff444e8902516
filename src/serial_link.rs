//! The real serial transport behind the [`Transport`] trait, plus device
//! discovery. The wall shows up as a USB serial adapter; we pick the first
//! port whose system name contains the configured substring (the installed
//! machine sees it as `usbserial-…`).

use crate::transport::{Transport, TransportError};
use log::info;
use serial2::SerialPort;
use std::path::{Path, PathBuf};

/// A [`Transport`] backed by a [`serial2::SerialPort`].
pub struct SerialLink {
    port: SerialPort,
}

impl SerialLink {
    /// Lists the serial devices visible to the system.
    pub fn list_devices() -> Result<Vec<PathBuf>, TransportError> {
        Ok(SerialPort::available_ports()?)
    }

    /// Opens the first device whose name contains `filter`, or `None` when
    /// nothing matches. The caller decides whether an absent device is fatal;
    /// for the installation it never is.
    pub fn open_matching(filter: &str, baud: u32) -> Result<Option<Self>, TransportError> {
        let device = Self::list_devices()?
            .into_iter()
            .find(|path| path.to_string_lossy().contains(filter));
        match device {
            Some(path) => Self::open(&path, baud).map(Some),
            None => Ok(None),
        }
    }

    /// Opens a specific device at the given baud rate.
    pub fn open(path: &Path, baud: u32) -> Result<Self, TransportError> {
        let port = SerialPort::open(path, baud)?;
        info!("opened serial device {} at {} baud", path.display(), baud);
        Ok(Self { port })
    }
}

impl Transport for SerialLink {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.port.write_all(line.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}
