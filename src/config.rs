//! Serial line configuration
//!
//! Settings for the physical link of one device session. The accepted value
//! set mirrors what the FX programming port supports; anything else fails
//! validation and therefore session startup.

use serde::{Deserialize, Serialize};

use crate::error::{FxError, Result};

/// Serial port settings for a device session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0", "COM1")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (7 or 8)
    pub data_bits: u8,
    /// Stop bits (only 1 is supported)
    pub stop_bits: u8,
    /// Parity ("None", "Even", "Odd")
    pub parity: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: 7,
            stop_bits: 1,
            parity: "Even".to_string(),
        }
    }
}

impl SerialConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(FxError::Config("port path cannot be empty".to_string()));
        }

        if self.baud_rate == 0 {
            return Err(FxError::Config(
                "baud rate must be greater than zero".to_string(),
            ));
        }

        if ![7, 8].contains(&self.data_bits) {
            return Err(FxError::Config(format!(
                "data bits must be 7 or 8, got {}",
                self.data_bits
            )));
        }

        if self.stop_bits != 1 {
            return Err(FxError::Config(format!(
                "stop bits must be 1, got {}",
                self.stop_bits
            )));
        }

        if !["None", "Even", "Odd"].contains(&self.parity.as_str()) {
            return Err(FxError::Config(format!(
                "parity must be None, Even, or Odd, got {}",
                self.parity
            )));
        }

        Ok(())
    }
}
