//! Serial transport layer
//!
//! This module defines the byte-level [`Transport`] interface the worker
//! drives and the production implementation over a tokio-serial stream.
//! The trait keeps the worker independent of the physical line, so tests
//! can substitute a scripted transport.
//!
//! The stream is owned by exactly one worker task; no locking is layered
//! over it.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{FxError, Result};

/// Byte-level transport for one serial device
#[async_trait]
pub trait Transport: Send + fmt::Debug {
    /// Transport type identifier
    fn transport_type(&self) -> &str;

    /// Open the device
    async fn connect(&mut self) -> Result<()>;

    /// Close the device
    async fn disconnect(&mut self) -> Result<()>;

    /// Write the whole buffer to the device
    ///
    /// Short writes are absorbed internally; the call either sends every
    /// byte or fails with [`FxError::WriteFailed`].
    async fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Wait up to `deadline` for readability and read what is available
    ///
    /// Returns the number of bytes placed into `buffer`; `Ok(0)` means the
    /// peer closed the line. An elapsed deadline maps to
    /// [`FxError::ResponseTimeout`].
    async fn receive(&mut self, buffer: &mut [u8], deadline: Duration) -> Result<usize>;

    /// Whether the device is currently open
    fn is_connected(&self) -> bool;
}

/// Production transport over a tokio-serial stream
#[derive(Debug)]
pub struct SerialTransport {
    config: SerialConfig,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    /// Create a transport for the given line settings
    pub fn new(config: SerialConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stream: None,
        })
    }

    fn parse_parity(&self) -> tokio_serial::Parity {
        match self.config.parity.as_str() {
            "Even" => tokio_serial::Parity::Even,
            "Odd" => tokio_serial::Parity::Odd,
            _ => tokio_serial::Parity::None,
        }
    }

    fn parse_data_bits(&self) -> tokio_serial::DataBits {
        match self.config.data_bits {
            7 => tokio_serial::DataBits::Seven,
            _ => tokio_serial::DataBits::Eight,
        }
    }
}

#[async_trait]
impl Transport for SerialTransport {
    fn transport_type(&self) -> &str {
        "serial"
    }

    async fn connect(&mut self) -> Result<()> {
        debug!("opening serial port: {}", self.config.port);

        let port_result = tokio_serial::new(&self.config.port, self.config.baud_rate)
            .data_bits(self.parse_data_bits())
            .parity(self.parse_parity())
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async();

        match port_result {
            Ok(port) => {
                #[cfg(unix)]
                {
                    let mut port = port;
                    port.set_exclusive(false).map_err(|e| {
                        FxError::DeviceOpen(format!("failed to set exclusive mode: {e}"))
                    })?;
                    self.stream = Some(port);
                }
                #[cfg(not(unix))]
                {
                    self.stream = Some(port);
                }

                info!("opened serial port: {}", self.config.port);
                Ok(())
            }
            Err(e) => Err(FxError::DeviceOpen(format!("{}: {e}", self.config.port))),
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.stream.take().is_some() {
            info!("closed serial port: {}", self.config.port);
        }
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize> {
        let Some(port) = self.stream.as_mut() else {
            return Err(FxError::WriteFailed("serial port not connected".to_string()));
        };

        port.write_all(data)
            .await
            .map_err(|e| FxError::WriteFailed(e.to_string()))?;
        port.flush()
            .await
            .map_err(|e| FxError::WriteFailed(e.to_string()))?;

        debug!(
            hex_data = %data.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(" "),
            length = data.len(),
            direction = "send",
            "raw frame"
        );
        Ok(data.len())
    }

    async fn receive(&mut self, buffer: &mut [u8], deadline: Duration) -> Result<usize> {
        let Some(port) = self.stream.as_mut() else {
            return Err(FxError::ReadFailed("serial port not connected".to_string()));
        };

        match timeout(deadline, port.read(buffer)).await {
            Ok(Ok(bytes_read)) => {
                debug!(
                    hex_data = %buffer[..bytes_read].iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(" "),
                    length = bytes_read,
                    direction = "recv",
                    "raw frame"
                );
                Ok(bytes_read)
            }
            Ok(Err(e)) => Err(FxError::ReadFailed(e.to_string())),
            Err(_) => Err(FxError::ResponseTimeout(format!(
                "no data within {deadline:?}"
            ))),
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
