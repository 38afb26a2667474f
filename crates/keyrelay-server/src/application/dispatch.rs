//! CommandDispatcher: the RPC-facing use case.
//!
//! One method per RPC call.  Each method validates its inputs, resolves key
//! ids through the [`KeyTable`], and then either drives the
//! [`KeyStateTracker`] (key calls) or writes a move/settle/action plan
//! straight to the [`DeviceLink`] (mouse calls).
//!
//! Validation always happens before the first write: a rejected request
//! leaves the device untouched.

use std::sync::Arc;
use std::time::Duration;

use keyrelay_core::domain::{CoordinateMode, MotionDelta, MouseAction, ScreenPoint};
use keyrelay_core::keymap::{KeyCode, KeyTable, KeymapError};
use keyrelay_core::protocol::{mouse_sequence, WireStep};
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::cursor::{CursorError, CursorLocator};
use super::device::{ChannelError, DeviceLink};
use super::key_state::{KeyStateTracker, KeyTransition};

/// Longest hold accepted for a timed key press.
pub const MAX_HOLD: Duration = Duration::from_secs(24 * 60 * 60);

/// Error type for dispatcher operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownKey(#[from] KeymapError),

    /// The hold duration is NaN, infinite, or longer than [`MAX_HOLD`].
    #[error("invalid hold duration: {0} ms")]
    InvalidDuration(f32),

    #[error(transparent)]
    Write(#[from] ChannelError),

    #[error(transparent)]
    Cursor(#[from] CursorError),
}

/// Serves RPC calls against one device link.
pub struct CommandDispatcher {
    table: KeyTable,
    tracker: KeyStateTracker,
    link: DeviceLink,
    cursor: Arc<dyn CursorLocator>,
    settle_delay: Duration,
}

impl CommandDispatcher {
    /// Creates a dispatcher over `link`, using `cursor` to locate the pointer
    /// and pausing `settle_delay` between a move and its click or scroll.
    pub fn new(link: DeviceLink, cursor: Arc<dyn CursorLocator>, settle_delay: Duration) -> Self {
        Self {
            table: KeyTable::device(),
            tracker: KeyStateTracker::new(link.clone()),
            link,
            cursor,
            settle_delay,
        }
    }

    /// Reports the coordinate convention absolute targets are given in.
    pub fn init(&self) -> CoordinateMode {
        info!("client initialised");
        CoordinateMode::Screen
    }

    /// Presses `key_id` and releases it `down_ms` milliseconds later.
    ///
    /// Returns as soon as KeyDown is written; the release happens in the
    /// background.  Negative durations are treated as zero.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UnknownKey`] / [`DispatchError::InvalidDuration`]
    ///   before anything is written.
    /// - [`DispatchError::Write`] if the KeyDown write fails (the release
    ///   timer is still armed).
    #[instrument(skip(self))]
    pub async fn send_key(&self, key_id: i32, down_ms: f32) -> Result<KeyTransition, DispatchError> {
        let code = self.resolve(key_id)?;
        let hold = hold_duration(down_ms)?;
        Ok(self.tracker.press_timed(code, hold).await?)
    }

    /// Releases `key_id` unless a timed press currently owns it.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownKey`] or [`DispatchError::Write`].
    #[instrument(skip(self))]
    pub async fn send_key_up(&self, key_id: i32) -> Result<KeyTransition, DispatchError> {
        let code = self.resolve(key_id)?;
        Ok(self.tracker.explicit_up(code).await?)
    }

    /// Presses `key_id` with no automatic release, unless a timed press
    /// currently owns it.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownKey`] or [`DispatchError::Write`].
    #[instrument(skip(self))]
    pub async fn send_key_down(&self, key_id: i32) -> Result<KeyTransition, DispatchError> {
        let code = self.resolve(key_id)?;
        Ok(self.tracker.explicit_down(code).await?)
    }

    /// Moves the pointer to `(x, y)` and optionally clicks or scrolls there.
    ///
    /// `width` and `height` describe the caller's screen and are only logged.
    /// The link lock is held for the whole plan, settle delay included, so no
    /// other write can land between the move and the action.
    ///
    /// Returns the delta that was sent.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Cursor`] if the pointer cannot be located; nothing
    ///   is written.
    /// - [`DispatchError::Write`] on the first failed write; later steps are
    ///   skipped.
    #[instrument(skip(self))]
    pub async fn send_mouse(
        &self,
        width: i32,
        height: i32,
        x: i32,
        y: i32,
        action: MouseAction,
    ) -> Result<MotionDelta, DispatchError> {
        let cursor = self.cursor.position()?;
        let delta = MotionDelta::between(cursor, ScreenPoint::new(x, y));
        debug!(?cursor, ?delta, "mouse target resolved");

        let mut state = self.link.lock().await;
        for step in mouse_sequence(action, delta) {
            match step {
                WireStep::Write(cmd) => state.send(&cmd)?,
                WireStep::Settle => tokio::time::sleep(self.settle_delay).await,
            }
        }
        Ok(delta)
    }

    /// Codes that currently have a live release timer.
    pub async fn live_keys(&self) -> Vec<KeyCode> {
        self.tracker.live_keys().await
    }

    fn resolve(&self, key_id: i32) -> Result<KeyCode, DispatchError> {
        Ok(self.table.resolve_id(key_id)?)
    }
}

/// Converts an RPC hold time in milliseconds into a [`Duration`].
fn hold_duration(down_ms: f32) -> Result<Duration, DispatchError> {
    if !down_ms.is_finite() {
        return Err(DispatchError::InvalidDuration(down_ms));
    }
    let secs = f64::from(down_ms.max(0.0)) / 1000.0;
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| *d <= MAX_HOLD)
        .ok_or(DispatchError::InvalidDuration(down_ms))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
