//! Register access API
//!
//! The request facade layered over the queue/worker pair. Each call builds
//! its frame, submits it with a fresh one-shot completion channel, and
//! waits out a bounded deadline for the worker's answer. A deadline expiry
//! does not cancel the in-flight command — the worker still completes or
//! drops it, and the late fulfillment is discarded.

use bytes::Bytes;
use tracing::debug;

use crate::command::{Command, CompletionReceiver};
use crate::constants::{DEFAULT_PRIORITY, MAX_FRAME_SIZE, REQUEST_TIMEOUT};
use crate::error::{FxError, Result};
use crate::frame::{self, RegisterSpace};
use crate::session::FxSerial;

impl FxSerial {
    /// Submit a prebuilt frame and obtain the completion handle
    ///
    /// The building block under the register methods, exposed for callers
    /// that construct frames themselves. Suspends while the queue's slot
    /// arena is exhausted.
    pub async fn submit_frame(&self, frame: Bytes, priority: u8) -> Result<CompletionReceiver> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(FxError::InvalidParameter(format!(
                "frame of {} bytes exceeds the {MAX_FRAME_SIZE} byte limit",
                frame.len()
            )));
        }

        let (command, completion) = Command::new(frame);
        self.queue.put(command, priority).await?;
        Ok(completion)
    }

    /// Read one 16-bit register
    pub async fn read_register(&self, address: u16, space: RegisterSpace) -> Result<u16> {
        let frame = frame::build_read_frame(address, 1, space)?;
        let completion = self.submit_frame(frame, DEFAULT_PRIORITY).await?;
        let response = completion.wait(REQUEST_TIMEOUT).await?;

        if response.len() < 5 {
            return Err(FxError::ReadFailed(format!(
                "short response: {} bytes",
                response.len()
            )));
        }
        frame::decode_word(&response[1..5], space)
    }

    /// Write one 16-bit register
    ///
    /// The device echoes a single acknowledgement byte, which is consumed
    /// but not interpreted.
    pub async fn write_register(
        &self,
        address: u16,
        value: u16,
        space: RegisterSpace,
    ) -> Result<()> {
        let data = frame::word_to_ascii(value);
        let frame = frame::build_write_frame(address, 1, &data, space)?;
        // TODO: submit writes at a higher priority than reads
        let completion = self.submit_frame(frame, DEFAULT_PRIORITY).await?;
        let response = completion.wait(REQUEST_TIMEOUT).await?;

        debug!(ack = ?response.first(), "write acknowledged");
        Ok(())
    }

    /// Read input bit block Xn
    pub async fn read_input_block(&self, block: u16) -> Result<u16> {
        self.read_register(block, RegisterSpace::InputBits).await
    }

    /// Read output bit block Yn
    pub async fn read_output_block(&self, block: u16) -> Result<u16> {
        self.read_register(block, RegisterSpace::OutputBits).await
    }

    /// Read data register Dn
    pub async fn read_data_register(&self, address: u16) -> Result<u16> {
        self.read_register(address, RegisterSpace::DataRegisters).await
    }
}
