//! # FX Link — Mitsubishi FX Programming-Port Protocol Driver
//!
//! An async driver for the ASCII-hex, checksum-framed register-access
//! protocol spoken on the programming port of FX-series PLCs. Any number
//! of application tasks issue read/write register requests concurrently;
//! a single worker task per session owns the serial line and serializes
//! all physical I/O.
//!
//! ## Features
//!
//! - **One worker per device**: all line I/O funnels through one task, so
//!   request/response pairs never interleave on the wire
//! - **Priority scheduling**: ten FIFO buckets over a fixed slot arena,
//!   with backpressure against producers when the arena fills
//! - **Bounded waits everywhere**: 5 s per-read response deadline in the
//!   worker, 2 s completion deadline in the request facade
//! - **Exact-layout codec**: address-space aware frame construction,
//!   checksum computation, and register decoding
//! - **Testable transport seam**: the worker drives an async `Transport`
//!   trait, so tests substitute a scripted line
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fx_link::{FxSerial, RegisterSpace, SerialConfig};
//!
//! #[tokio::main]
//! async fn main() -> fx_link::Result<()> {
//!     let session = FxSerial::start(SerialConfig {
//!         port: "/dev/ttyUSB0".to_string(),
//!         ..SerialConfig::default()
//!     })
//!     .await?;
//!
//!     // Read data register D123
//!     let value = session.read_data_register(123).await?;
//!     println!("D123 = {value:#06X}");
//!
//!     // Write D120
//!     session
//!         .write_register(120, 0xAB3D, RegisterSpace::DataRegisters)
//!         .await?;
//!
//!     session.stop().await?;
//!     Ok(())
//! }
//! ```

/// Core error types and result handling
pub mod error;

/// Protocol constants and operating limits
pub mod constants;

/// Frame construction, checksums, and register decoding
pub mod frame;

/// Queued command payload and completion delivery
pub mod command;

/// Fixed-capacity priority command queue
pub mod queue;

/// Serial line configuration
pub mod config;

/// Transport trait and the tokio-serial implementation
pub mod transport;

/// Session lifecycle and the worker loop
pub mod session;

/// Logger initialisation for binaries
pub mod logging;

mod client;

pub use command::{Command, CompletionReceiver, Response};
pub use config::SerialConfig;
pub use error::{FxError, Result};
pub use frame::RegisterSpace;
pub use queue::{CommandQueue, QueueStats};
pub use session::{FxSerial, LinkStatsSnapshot};
pub use transport::{SerialTransport, Transport};
