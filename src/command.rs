//! Queued command payload and completion delivery
//!
//! A [`Command`] carries one fully built frame from a producer task to the
//! worker, paired with the sending half of a one-shot completion channel.
//! The worker consumes a command exactly once: it either fulfills the
//! channel with the raw response bytes or drops the command on an error
//! path, which closes the channel. Receivers abandoned by a timed-out
//! caller are tolerated on both sides.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::{FxError, Result};

/// Raw response bytes delivered back to the submitting task
pub type Response = Vec<u8>;

/// One framed request handed to the worker
#[derive(Debug)]
pub struct Command {
    frame: Bytes,
    done: oneshot::Sender<Response>,
}

impl Command {
    /// Create a command and the caller-side handle awaiting its completion
    pub fn new(frame: Bytes) -> (Self, CompletionReceiver) {
        let (done, receiver) = oneshot::channel();
        (Self { frame, done }, CompletionReceiver { receiver })
    }

    /// The outgoing wire frame
    pub fn frame(&self) -> &Bytes {
        &self.frame
    }

    /// Deliver the response to the submitter
    ///
    /// A receiver abandoned by a caller whose wait already expired is not
    /// an error; the response is discarded.
    pub fn complete(self, response: Response) {
        let _ = self.done.send(response);
    }
}

/// Caller-side handle for one command's response
#[derive(Debug)]
pub struct CompletionReceiver {
    receiver: oneshot::Receiver<Response>,
}

impl CompletionReceiver {
    /// Wait for the response under `deadline`
    ///
    /// An expired deadline and a channel closed by a worker-side drop both
    /// report [`FxError::RequestTimeout`]; either way the command is not
    /// cancelled and a late completion is discarded harmlessly.
    pub async fn wait(self, deadline: Duration) -> Result<Response> {
        match tokio::time::timeout(deadline, self.receiver).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(FxError::RequestTimeout(
                "command dropped before completion".to_string(),
            )),
            Err(_) => Err(FxError::RequestTimeout(format!(
                "no completion within {deadline:?}"
            ))),
        }
    }
}
