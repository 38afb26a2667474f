//! The device link: one serial channel plus the per-key timer table.
//!
//! Every byte sent to the input-emulation device goes through a
//! [`DeviceLink`].  The link owns the channel and the key timer table behind a
//! single async mutex, so a write and the liveness transition that goes with
//! it always happen together.  Timed key releases, explicit key commands, and
//! mouse sequences all take the same lock; their byte sequences can never
//! interleave.
//!
//! The channel itself is abstracted by [`SerialChannel`] so the application
//! layer never touches the `serialport` crate directly.

use std::sync::Arc;

use keyrelay_core::keymap::KeyCode;
use keyrelay_core::protocol::{encode_command, DeviceCommand};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::trace;

/// Error type for serial channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No device could be opened.  Fatal at startup.
    #[error("input device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A write to an open device failed.  Surfaced to the caller, never retried.
    #[error("serial write failed: {0}")]
    WriteFailure(String),
}

/// Ordered, write-only byte sink to the input-emulation device.
///
/// Implementations live in the infrastructure layer.  The device never
/// answers, so there is no read side.
///
/// `write_all` is called on a Tokio worker thread while the [`DeviceLink`]
/// lock is held, so implementations must not block for long: every other
/// write and every release timer waits behind it.  Bound blocking I/O with a
/// short timeout.
pub trait SerialChannel: Send {
    /// Writes all of `bytes` to the device, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::WriteFailure`] if the underlying write fails.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError>;
}

/// An armed, not-yet-fired release for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTimer {
    pub code: KeyCode,
    pub deadline: Instant,
    /// Distinguishes this timer from any later timer for the same key.
    pub generation: u64,
}

/// State guarded by the link mutex.
pub struct LinkState {
    channel: Box<dyn SerialChannel>,
    timers: [Option<KeyTimer>; 256],
}

impl LinkState {
    /// Encodes `cmd` and writes it to the channel.
    ///
    /// # Errors
    ///
    /// Propagates the channel's [`ChannelError`].
    pub fn send(&mut self, cmd: &DeviceCommand) -> Result<(), ChannelError> {
        let bytes = encode_command(cmd);
        trace!(?cmd, len = bytes.len(), "writing device command");
        self.channel.write_all(&bytes)
    }

    /// Returns the live timer for `code`, if any.
    pub fn timer(&self, code: KeyCode) -> Option<&KeyTimer> {
        self.timers[usize::from(code.as_u8())].as_ref()
    }

    /// Arms `timer` in its key's slot.  The slot must be empty.
    pub(crate) fn arm(&mut self, timer: KeyTimer) {
        let slot = &mut self.timers[usize::from(timer.code.as_u8())];
        debug_assert!(slot.is_none(), "arming over a live timer");
        *slot = Some(timer);
    }

    /// Clears the slot for `code` if it still holds `generation`.
    ///
    /// Returns `true` if the slot was cleared.
    pub(crate) fn disarm(&mut self, code: KeyCode, generation: u64) -> bool {
        let slot = &mut self.timers[usize::from(code.as_u8())];
        match slot {
            Some(t) if t.generation == generation => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Codes with a live timer, in ascending order.
    pub fn live_codes(&self) -> Vec<KeyCode> {
        self.timers.iter().flatten().map(|t| t.code).collect()
    }
}

/// Shared handle to the device.  Cloning is cheap; all clones share one lock.
#[derive(Clone)]
pub struct DeviceLink {
    inner: Arc<Mutex<LinkState>>,
}

impl DeviceLink {
    /// Wraps an open channel with an empty timer table.
    pub fn new(channel: Box<dyn SerialChannel>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LinkState {
                channel,
                timers: [None; 256],
            })),
        }
    }

    /// Takes the link lock.
    ///
    /// Hold the guard for the whole of a multi-write sequence.
    pub async fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.inner.lock().await
    }

    /// Takes the lock as an owned guard, for spawned tasks.
    pub(crate) async fn lock_owned(&self) -> tokio::sync::OwnedMutexGuard<LinkState> {
        Arc::clone(&self.inner).lock_owned().await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
