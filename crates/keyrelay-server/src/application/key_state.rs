//! KeyStateTracker: per-key hold state and automatic release.
//!
//! # The state machine
//!
//! Each key code is either *idle* or *held by a timer*.  A key is held by a
//! timer from the moment a timed press writes its KeyDown until that timer
//! fires and writes the KeyUp.
//!
//! | Call            | Idle key                         | Held key |
//! |-----------------|----------------------------------|----------|
//! | `press_timed`   | write KeyDown, arm release timer | no-op    |
//! | `explicit_up`   | write KeyUp                      | no-op    |
//! | `explicit_down` | write KeyDown (no timer)         | no-op    |
//!
//! A held key's timer is the only authority for its release: an explicit up
//! while the timer is live does not cancel or shorten it.  Timers are never
//! cancelled; once armed they always fire.
//!
//! The check and the write happen under the [`DeviceLink`] lock, so a timer
//! that fires concurrently with a new press cannot make the press observe a
//! stale "held" flag.

use std::sync::Arc;
use std::time::Duration;

use keyrelay_core::domain::GenerationCounter;
use keyrelay_core::keymap::KeyCode;
use keyrelay_core::protocol::DeviceCommand;
use tokio::time::Instant;
use tracing::{debug, error};

use super::device::{ChannelError, DeviceLink, KeyTimer};

/// What a tracker call did to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    /// A KeyDown was written.
    Pressed,
    /// A KeyUp was written.
    Released,
    /// A release timer owns the key; nothing was written.
    AlreadyHeld,
}

/// Owns the per-key timers and writes key transitions to the device.
#[derive(Clone)]
pub struct KeyStateTracker {
    link: DeviceLink,
    generations: Arc<GenerationCounter>,
}

impl KeyStateTracker {
    pub fn new(link: DeviceLink) -> Self {
        Self {
            link,
            generations: Arc::new(GenerationCounter::new()),
        }
    }

    /// Presses `code` now and releases it after `hold`.
    ///
    /// The timer is armed before KeyDown is written.  If the write fails the
    /// error is returned but the timer stays armed and still fires, so the key
    /// cannot stay "held" forever.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the KeyDown write fails.
    pub async fn press_timed(
        &self,
        code: KeyCode,
        hold: Duration,
    ) -> Result<KeyTransition, ChannelError> {
        let mut state = self.link.lock().await;
        if let Some(live) = state.timer(code) {
            debug!(%code, generation = live.generation, "key already held; ignoring press");
            return Ok(KeyTransition::AlreadyHeld);
        }

        let timer = KeyTimer {
            code,
            deadline: Instant::now() + hold,
            generation: self.generations.next(),
        };
        state.arm(timer);
        self.spawn_release(timer);

        state.send(&DeviceCommand::KeyDown(code))?;
        debug!(%code, hold_ms = hold.as_millis() as u64, "key pressed with timed release");
        Ok(KeyTransition::Pressed)
    }

    /// Releases `code` now unless a timer owns it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the KeyUp write fails.
    pub async fn explicit_up(&self, code: KeyCode) -> Result<KeyTransition, ChannelError> {
        let mut state = self.link.lock().await;
        if state.timer(code).is_some() {
            debug!(%code, "release timer owns key; ignoring explicit up");
            return Ok(KeyTransition::AlreadyHeld);
        }
        state.send(&DeviceCommand::KeyUp(code))?;
        Ok(KeyTransition::Released)
    }

    /// Presses `code` now, with no automatic release, unless a timer owns it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the KeyDown write fails.
    pub async fn explicit_down(&self, code: KeyCode) -> Result<KeyTransition, ChannelError> {
        let mut state = self.link.lock().await;
        if state.timer(code).is_some() {
            debug!(%code, "release timer owns key; ignoring explicit down");
            return Ok(KeyTransition::AlreadyHeld);
        }
        state.send(&DeviceCommand::KeyDown(code))?;
        Ok(KeyTransition::Pressed)
    }

    /// Codes that currently have a live release timer.
    pub async fn live_keys(&self) -> Vec<KeyCode> {
        self.link.lock().await.live_codes()
    }

    fn spawn_release(&self, timer: KeyTimer) {
        let link = self.link.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(timer.deadline).await;
            let mut state = link.lock_owned().await;
            if !state.disarm(timer.code, timer.generation) {
                return;
            }
            // The slot is already clear; a failed write still counts as fired.
            match state.send(&DeviceCommand::KeyUp(timer.code)) {
                Ok(()) => debug!(code = %timer.code, "timed release fired"),
                Err(e) => error!(code = %timer.code, "timed release write failed: {e}"),
            }
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device::SerialChannel;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    // ── Mock channel ──────────────────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct RecordingChannel {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        should_fail: Arc<AtomicBool>,
    }

    impl RecordingChannel {
        fn writes(&self) -> Vec<Vec<u8>> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl SerialChannel for RecordingChannel {
        fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
            if self.should_fail.load(Ordering::SeqCst) {
                return Err(ChannelError::WriteFailure("injected failure".to_string()));
            }
            self.writes.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }
    }

    fn make_tracker() -> (KeyStateTracker, RecordingChannel) {
        let channel = RecordingChannel::default();
        let tracker = KeyStateTracker::new(DeviceLink::new(Box::new(channel.clone())));
        (tracker, channel)
    }

    const A: KeyCode = KeyCode(b'a');
    const B: KeyCode = KeyCode(b'b');

    // ── press_timed ───────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_press_timed_writes_down_then_up_after_hold() {
        // Arrange
        let (tracker, channel) = make_tracker();

        // Act
        let transition = tracker.press_timed(A, Duration::from_millis(100)).await.unwrap();

        // Assert: down now, nothing else until the deadline.
        assert_eq!(transition, KeyTransition::Pressed);
        assert_eq!(channel.writes(), vec![vec![0x01, 0x61]]);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(channel.writes().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(channel.writes(), vec![vec![0x01, 0x61], vec![0x02, 0x61]]);
        assert!(tracker.live_keys().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_press_while_held_is_noop_and_keeps_first_deadline() {
        let (tracker, channel) = make_tracker();

        tracker.press_timed(A, Duration::from_millis(100)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = tracker.press_timed(A, Duration::from_millis(500)).await.unwrap();

        assert_eq!(second, KeyTransition::AlreadyHeld);
        assert_eq!(channel.writes().len(), 1);

        // First timer fires at t=100, not t=550.
        tokio::time::sleep(Duration::from_millis(51)).await;
        assert_eq!(channel.writes().last(), Some(&vec![0x02, 0x61]));
        assert_eq!(channel.writes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_after_release_arms_a_new_timer() {
        let (tracker, channel) = make_tracker();

        tracker.press_timed(A, Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let again = tracker.press_timed(A, Duration::from_millis(10)).await.unwrap();

        assert_eq!(again, KeyTransition::Pressed);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            channel.writes(),
            vec![vec![1, 0x61], vec![2, 0x61], vec![1, 0x61], vec![2, 0x61]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_keys_have_independent_timers() {
        let (tracker, channel) = make_tracker();

        tracker.press_timed(A, Duration::from_millis(100)).await.unwrap();
        tracker.press_timed(B, Duration::from_millis(30)).await.unwrap();
        assert_eq!(tracker.live_keys().await, vec![A, B]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            channel.writes(),
            vec![vec![1, 0x61], vec![1, 0x62], vec![2, 0x62], vec![2, 0x61]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_hold_releases_on_next_tick() {
        let (tracker, channel) = make_tracker();

        tracker.press_timed(A, Duration::ZERO).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(channel.writes(), vec![vec![1, 0x61], vec![2, 0x61]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_down_write_still_arms_timer() {
        // Arrange
        let (tracker, channel) = make_tracker();
        channel.should_fail.store(true, Ordering::SeqCst);

        // Act
        let result = tracker.press_timed(A, Duration::from_millis(10)).await;

        // Assert
        assert!(matches!(result, Err(ChannelError::WriteFailure(_))));
        assert_eq!(tracker.live_keys().await, vec![A]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_release_write_still_clears_timer() {
        let (tracker, channel) = make_tracker();

        tracker.press_timed(A, Duration::from_millis(10)).await.unwrap();
        channel.should_fail.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(tracker.live_keys().await.is_empty());
        assert_eq!(channel.writes().len(), 1);
    }

    // ── press racing the release timer ────────────────────────────────────────

    /// Checks that `code` alternates KeyDown/KeyUp starting with a down and
    /// ending with an up, and returns how many presses it saw.
    fn assert_alternates(writes: &[Vec<u8>], code: KeyCode) -> usize {
        let ops: Vec<u8> = writes
            .iter()
            .filter(|w| w.get(1) == Some(&code.0))
            .map(|w| w[0])
            .collect();
        for (i, op) in ops.iter().enumerate() {
            let expected = if i % 2 == 0 { 0x01 } else { 0x02 };
            assert_eq!(*op, expected, "write #{i} for {code} in {ops:?}");
        }
        assert_eq!(ops.len() % 2, 0, "{code} left pressed: {ops:?}");
        ops.len() / 2
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_at_exact_deadline_never_doubles_down() {
        // Arrange
        let (tracker, channel) = make_tracker();
        let hold = Duration::from_millis(10);
        let mut pressed = 0;

        // Act: every press lands on the instant the previous timer is due.
        tracker.press_timed(A, hold).await.unwrap();
        pressed += 1;
        for _ in 0..25 {
            tokio::time::sleep(hold).await;
            if tracker.press_timed(A, hold).await.unwrap() == KeyTransition::Pressed {
                pressed += 1;
            }
        }
        tokio::time::sleep(hold * 3).await;

        // Assert
        assert_eq!(assert_alternates(&channel.writes(), A), pressed);
        assert!(tracker.live_keys().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_presses_on_shared_deadlines_pair_every_down_with_one_up() {
        // Arrange: offsets are multiples of 5 ms against a 10 ms hold, so
        // many presses arrive exactly when a timer is due.
        let (tracker, channel) = make_tracker();
        let hold = Duration::from_millis(10);
        let mut tasks = Vec::new();
        for i in 0..60u64 {
            let tracker = tracker.clone();
            let code = if i % 3 == 0 { B } else { A };
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis((i % 12) * 5)).await;
                (code, tracker.press_timed(code, hold).await.unwrap())
            }));
        }

        // Act
        let mut pressed_a = 0;
        let mut pressed_b = 0;
        for task in tasks {
            match task.await.unwrap() {
                (code, KeyTransition::Pressed) if code == A => pressed_a += 1,
                (_, KeyTransition::Pressed) => pressed_b += 1,
                _ => {}
            }
        }
        tokio::time::sleep(hold * 3).await;

        // Assert
        let writes = channel.writes();
        assert_eq!(assert_alternates(&writes, A), pressed_a);
        assert_eq!(assert_alternates(&writes, B), pressed_b);
        assert!(pressed_a > 0 && pressed_b > 0);
        assert!(tracker.live_keys().await.is_empty());
    }

    // ── explicit_up / explicit_down ───────────────────────────────────────────

    #[tokio::test]
    async fn test_explicit_up_on_idle_key_writes_up() {
        let (tracker, channel) = make_tracker();

        let t = tracker.explicit_up(A).await.unwrap();

        assert_eq!(t, KeyTransition::Released);
        assert_eq!(channel.writes(), vec![vec![0x02, 0x61]]);
    }

    #[tokio::test]
    async fn test_explicit_down_on_idle_key_writes_down_without_timer() {
        let (tracker, channel) = make_tracker();

        let t = tracker.explicit_down(A).await.unwrap();

        assert_eq!(t, KeyTransition::Pressed);
        assert_eq!(channel.writes(), vec![vec![0x01, 0x61]]);
        assert!(tracker.live_keys().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_up_while_timer_live_is_noop() {
        let (tracker, channel) = make_tracker();

        tracker.press_timed(A, Duration::from_millis(100)).await.unwrap();
        let t = tracker.explicit_up(A).await.unwrap();

        assert_eq!(t, KeyTransition::AlreadyHeld);
        assert_eq!(channel.writes(), vec![vec![0x01, 0x61]]);

        tokio::time::sleep(Duration::from_millis(101)).await;
        assert_eq!(channel.writes(), vec![vec![0x01, 0x61], vec![0x02, 0x61]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_down_while_timer_live_is_noop() {
        let (tracker, channel) = make_tracker();

        tracker.press_timed(A, Duration::from_millis(100)).await.unwrap();
        let t = tracker.explicit_down(A).await.unwrap();

        assert_eq!(t, KeyTransition::AlreadyHeld);
        assert_eq!(channel.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_writes_surface_channel_errors() {
        let (tracker, channel) = make_tracker();
        channel.should_fail.store(true, Ordering::SeqCst);

        assert!(tracker.explicit_up(A).await.is_err());
        assert!(tracker.explicit_down(A).await.is_err());
    }
}
