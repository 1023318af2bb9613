//! Error handling for the FX serial link driver
//!
//! This module provides the crate-wide error type and result alias. Worker
//! internal failures (validation, write, response) are handled locally by
//! dropping the affected command; only session startup errors and
//! caller-side deadline expiries surface through the public API.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, FxError>;

/// FX serial link error type
#[derive(Error, Debug, Clone)]
pub enum FxError {
    /// Serial device could not be opened
    #[error("Failed to open device: {0}")]
    DeviceOpen(String),

    /// Unsupported serial line configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outgoing frame failed validation (bad STX/op, count over ceiling)
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Frame could not be written to the device
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// No response data arrived within the per-read deadline
    #[error("Response timed out: {0}")]
    ResponseTimeout(String),

    /// Read failed or the device closed the line
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Caller-side wait for a completion expired
    #[error("Request timed out: {0}")]
    RequestTimeout(String),

    /// Invalid argument to a codec or queue operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
