//! Device session lifecycle and the serial worker loop
//!
//! A session owns the command queue, the link counters, and the single
//! worker task that drives the transport. The worker is the only task that
//! ever touches the device: it dequeues one command at a time, validates
//! the outgoing frame, writes it, accumulates the bounded-length response
//! under a per-read deadline, and fulfills the command's completion
//! channel. Commands that fail validation, writing, or response collection
//! are dropped on the spot — no retry, no requeue — and the error counter
//! is bumped; the submitter observes the drop through its closed
//! completion channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::SerialConfig;
use crate::constants::{
    MAX_RESPONSE_LEN, OP_READ, OP_WRITE, READ_FRAME_LEN, RESPONSE_TIMEOUT, STX, WRITE_RESPONSE_LEN,
};
use crate::error::{FxError, Result};
use crate::queue::{CommandQueue, QueueStats};
use crate::transport::{SerialTransport, Transport};

/// Link counters, updated by the worker
#[derive(Debug, Default)]
pub(crate) struct LinkStats {
    sent: AtomicU64,
    received: AtomicU64,
    errors: AtomicU64,
}

impl LinkStats {
    fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the link counters
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LinkStatsSnapshot {
    /// Frames written to the device
    pub sent: u64,
    /// Complete responses delivered
    pub received: u64,
    /// Commands dropped on validation, write, or response errors
    pub errors: u64,
}

/// One open device session
///
/// Created by [`FxSerial::start`], torn down by [`FxSerial::stop`]. All
/// request methods take `&self`, so the session can be shared across
/// producer tasks behind an `Arc`.
#[derive(Debug)]
pub struct FxSerial {
    pub(crate) queue: Arc<CommandQueue>,
    pub(crate) stats: Arc<LinkStats>,
    worker: JoinHandle<()>,
    config: SerialConfig,
}

impl FxSerial {
    /// Open the serial device and start the worker
    ///
    /// Fails on an unsupported line configuration or when the device
    /// cannot be opened; both are fatal to startup.
    pub async fn start(config: SerialConfig) -> Result<Self> {
        let mut transport = SerialTransport::new(config.clone())?;
        transport.connect().await?;
        Ok(Self::spawn(config, Box::new(transport)))
    }

    /// Start a session over an already-built transport
    ///
    /// The transport is used as-is; `connect` is not called. This is the
    /// seam for driving the worker against a scripted transport in tests.
    pub fn start_with_transport(
        config: SerialConfig,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::spawn(config, transport))
    }

    fn spawn(config: SerialConfig, transport: Box<dyn Transport>) -> Self {
        let queue = Arc::new(CommandQueue::new());
        let stats = Arc::new(LinkStats::default());
        let worker = tokio::spawn(run_worker(transport, queue.clone(), stats.clone()));

        info!(port = %config.port, "session started");
        Self {
            queue,
            stats,
            worker,
            config,
        }
    }

    /// Stop the worker and release the device
    ///
    /// An in-flight command is abandoned at the next await point; its
    /// completion channel closes and any waiting submitter observes a
    /// request timeout.
    pub async fn stop(mut self) -> Result<()> {
        self.worker.abort();
        let _ = (&mut self.worker).await;
        info!(port = %self.config.port, "session stopped");
        Ok(())
    }

    /// Current link counters
    pub fn stats(&self) -> LinkStatsSnapshot {
        self.stats.snapshot()
    }

    /// Current queue counters
    pub async fn queue_stats(&self) -> QueueStats {
        self.queue.stats().await
    }

    /// The line settings this session was started with
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl Drop for FxSerial {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

/// Expected response length for a validated outgoing frame
///
/// For reads the two count digits are re-parsed out of the frame itself.
/// The count field was doubled when the frame was built, so deriving the
/// expectation from the submitter's word count would disagree with the
/// wire for multi-word reads; the frame is the authority.
fn expected_response_len(frame: &[u8]) -> Result<usize> {
    if frame.len() < READ_FRAME_LEN {
        return Err(FxError::InvalidCommand(format!(
            "frame of {} bytes is too short",
            frame.len()
        )));
    }
    if frame[0] != STX {
        return Err(FxError::InvalidCommand(format!(
            "frame does not start with STX, got 0x{:02X}",
            frame[0]
        )));
    }

    match frame[1] {
        OP_READ => {
            let tens = frame[6].wrapping_sub(b'0') as usize;
            let ones = frame[7].wrapping_sub(b'0') as usize;
            if tens > 9 || ones > 9 {
                return Err(FxError::InvalidCommand(
                    "count field is not decimal".to_string(),
                ));
            }

            // Data bytes + STX + ETX + checksum digits.
            let expected = (tens * 10 + ones) * 2 + 4;
            if expected > MAX_RESPONSE_LEN {
                return Err(FxError::InvalidCommand(format!(
                    "expected response of {expected} bytes exceeds {MAX_RESPONSE_LEN}"
                )));
            }
            Ok(expected)
        }
        OP_WRITE => Ok(WRITE_RESPONSE_LEN),
        other => Err(FxError::InvalidCommand(format!(
            "unknown op byte 0x{other:02X}"
        ))),
    }
}

/// Worker loop: dequeue, validate, write, collect the response, deliver
async fn run_worker(
    mut transport: Box<dyn Transport>,
    queue: Arc<CommandQueue>,
    stats: Arc<LinkStats>,
) {
    loop {
        let command = queue.get().await;

        let expected = match expected_response_len(command.frame()) {
            Ok(expected) => expected,
            Err(e) => {
                warn!("dropping command: {e}");
                stats.record_error();
                continue;
            }
        };

        if let Err(e) = transport.send(command.frame()).await {
            warn!("dropping command: {e}");
            stats.record_error();
            continue;
        }
        stats.record_sent();

        let mut response = vec![0u8; expected];
        let mut filled = 0;
        let mut dropped = false;
        while filled < expected {
            match transport
                .receive(&mut response[filled..], RESPONSE_TIMEOUT)
                .await
            {
                Ok(0) => {
                    warn!("dropping command: line closed while awaiting response");
                    dropped = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) => {
                    warn!("dropping command: {e}");
                    dropped = true;
                    break;
                }
            }
        }
        if dropped {
            stats.record_error();
            continue;
        }

        stats.record_received();
        debug!(length = filled, "response complete");
        command.complete(response);
    }
}
