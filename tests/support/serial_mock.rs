//! Scriptable serial transport for driver tests
//!
//! Stands in for the real serial line so worker behavior can be exercised
//! without hardware. Each frame written to the mock consumes one script
//! step deciding what the fake device answers: immediate bytes, delayed
//! bytes (virtual-time friendly), a closed line, or silence.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use fx_link::{FxError, Result, Transport};

/// What the fake device does with the next frame written to it
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Queue these bytes as the response immediately
    Respond(Vec<u8>),
    /// Queue the bytes after the given delay
    RespondAfter(Duration, Vec<u8>),
    /// Queue the first chunk immediately and the second after the delay
    SplitRespond(Vec<u8>, Duration, Vec<u8>),
    /// Fail the write carrying this frame
    FailWrite,
    /// Signal end-of-line: the next read returns zero bytes
    CloseLine,
    /// Produce nothing; the worker's read deadline must fire
    Silent,
}

#[derive(Debug, Default)]
struct MockState {
    written: Vec<Vec<u8>>,
    script: VecDeque<ScriptStep>,
    pending: VecDeque<u8>,
    eof_pending: bool,
    connected: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<MockState>,
    data_ready: Notify,
}

impl Shared {
    fn deliver(&self, bytes: &[u8]) {
        self.state.lock().unwrap().pending.extend(bytes);
        self.data_ready.notify_one();
    }
}

/// Transport half handed to the session under test
#[derive(Debug)]
pub struct MockSerialPort {
    shared: Arc<Shared>,
}

/// Test-side handle for scripting the device and inspecting traffic
#[derive(Debug, Clone)]
pub struct MockHandle {
    shared: Arc<Shared>,
}

/// Create a connected mock transport and its scripting handle
pub fn mock_serial() -> (MockSerialPort, MockHandle) {
    let shared = Arc::new(Shared {
        state: Mutex::new(MockState {
            connected: true,
            ..MockState::default()
        }),
        data_ready: Notify::new(),
    });
    (
        MockSerialPort {
            shared: shared.clone(),
        },
        MockHandle { shared },
    )
}

impl MockHandle {
    /// Append a script step for the next unanswered frame
    pub fn push(&self, step: ScriptStep) {
        self.shared.state.lock().unwrap().script.push_back(step);
    }

    /// All frames written to the mock so far
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().unwrap().written.clone()
    }
}

#[async_trait]
impl Transport for MockSerialPort {
    fn transport_type(&self) -> &str {
        "mock"
    }

    async fn connect(&mut self) -> Result<()> {
        self.shared.state.lock().unwrap().connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.shared.state.lock().unwrap().connected = false;
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize> {
        let step = {
            let mut state = self.shared.state.lock().unwrap();
            if !state.connected {
                return Err(FxError::WriteFailed("mock line not connected".to_string()));
            }
            state.written.push(data.to_vec());
            state.script.pop_front()
        };

        match step {
            Some(ScriptStep::Respond(bytes)) => self.shared.deliver(&bytes),
            Some(ScriptStep::RespondAfter(delay, bytes)) => {
                let shared = self.shared.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    shared.deliver(&bytes);
                });
            }
            Some(ScriptStep::SplitRespond(first, delay, rest)) => {
                self.shared.deliver(&first);
                let shared = self.shared.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    shared.deliver(&rest);
                });
            }
            Some(ScriptStep::FailWrite) => {
                return Err(FxError::WriteFailed("mock write failure".to_string()));
            }
            Some(ScriptStep::CloseLine) => {
                self.shared.state.lock().unwrap().eof_pending = true;
                self.shared.data_ready.notify_one();
            }
            Some(ScriptStep::Silent) | None => {}
        }

        Ok(data.len())
    }

    async fn receive(&mut self, buffer: &mut [u8], deadline: Duration) -> Result<usize> {
        loop {
            let notified = {
                let mut state = self.shared.state.lock().unwrap();
                if !state.pending.is_empty() {
                    let count = buffer.len().min(state.pending.len());
                    for slot in buffer.iter_mut().take(count) {
                        *slot = state.pending.pop_front().unwrap();
                    }
                    return Ok(count);
                }
                if state.eof_pending {
                    state.eof_pending = false;
                    return Ok(0);
                }
                self.shared.data_ready.notified()
            };

            if tokio::time::timeout(deadline, notified).await.is_err() {
                return Err(FxError::ResponseTimeout(format!(
                    "no data within {deadline:?}"
                )));
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.shared.state.lock().unwrap().connected
    }
}
