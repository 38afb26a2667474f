//! In-memory serial channel for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use keyrelay_core::protocol::{decode_stream, DeviceCommand, ProtocolError};

use crate::application::device::{ChannelError, SerialChannel};

/// A [`SerialChannel`] that records every write.
///
/// Clones share the same recording, so a test can hand one clone to the
/// [`DeviceLink`](crate::application::device::DeviceLink) and keep another to
/// inspect what was written.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Each successful write call, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Every byte written, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.writes().concat()
    }

    /// The recorded byte stream decoded back into commands.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the stream is not valid device protocol.
    pub fn commands(&self) -> Result<Vec<DeviceCommand>, ProtocolError> {
        decode_stream(&self.bytes())
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut w) = self.writes.lock() {
            w.clear();
        }
    }
}

impl SerialChannel for RecordingChannel {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChannelError::WriteFailure("injected failure".to_string()));
        }
        self.writes
            .lock()
            .map_err(|e| ChannelError::WriteFailure(e.to_string()))?
            .push(bytes.to_vec());
        Ok(())
    }
}
