//! Integration tests for timed key presses through the public dispatcher API.
//!
//! Time is paused, so hold durations are exact and the tests run instantly.

use std::sync::Arc;
use std::time::Duration;

use keyrelay_core::keymap::{Key, KeyCode};
use keyrelay_core::protocol::DeviceCommand;
use keyrelay_server::application::device::DeviceLink;
use keyrelay_server::application::dispatch::{CommandDispatcher, DispatchError};
use keyrelay_server::application::key_state::KeyTransition;
use keyrelay_server::infrastructure::cursor::FixedCursorLocator;
use keyrelay_server::infrastructure::serial::RecordingChannel;
use tokio::time::sleep;
use tokio_test::assert_ok;

fn setup() -> (CommandDispatcher, RecordingChannel) {
    let recorder = RecordingChannel::new();
    let dispatcher = CommandDispatcher::new(
        DeviceLink::new(Box::new(recorder.clone())),
        Arc::new(FixedCursorLocator::new(0, 0)),
        Duration::from_millis(80),
    );
    (dispatcher, recorder)
}

const A: KeyCode = KeyCode(b'a');

#[tokio::test(start_paused = true)]
async fn test_send_key_then_send_key_up_leaves_release_to_timer() {
    // Arrange
    let (dispatcher, recorder) = setup();

    // Act: press A for 100 ms, then immediately ask for an explicit up.
    let press = assert_ok!(dispatcher.send_key(Key::A.id(), 100.0).await);
    let up = assert_ok!(dispatcher.send_key_up(Key::A.id()).await);

    // Assert: only the down so far; the explicit up did nothing.
    assert_eq!(press, KeyTransition::Pressed);
    assert_eq!(up, KeyTransition::AlreadyHeld);
    assert_eq!(recorder.bytes(), vec![0x01, 0x61]);

    sleep(Duration::from_millis(99)).await;
    assert_eq!(recorder.bytes(), vec![0x01, 0x61]);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(recorder.bytes(), vec![0x01, 0x61, 0x02, 0x61]);
}

#[tokio::test(start_paused = true)]
async fn test_every_key_emits_exactly_one_down_and_one_up() {
    let (dispatcher, recorder) = setup();

    for key in Key::ALL {
        dispatcher.send_key(key.id(), 10.0).await.unwrap();
        sleep(Duration::from_millis(20)).await;
    }

    let commands = recorder.commands().unwrap();
    assert_eq!(commands.len(), 2 * Key::ALL.len());
    for pair in commands.chunks(2) {
        match pair {
            [DeviceCommand::KeyDown(d), DeviceCommand::KeyUp(u)] => assert_eq!(d, u),
            other => panic!("unexpected pair {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_repeated_send_key_while_held_is_idempotent() {
    let (dispatcher, recorder) = setup();

    dispatcher.send_key(Key::A.id(), 100.0).await.unwrap();
    for _ in 0..5 {
        sleep(Duration::from_millis(10)).await;
        let t = dispatcher.send_key(Key::A.id(), 1000.0).await.unwrap();
        assert_eq!(t, KeyTransition::AlreadyHeld);
    }
    sleep(Duration::from_millis(60)).await;

    assert_eq!(
        recorder.commands().unwrap(),
        vec![DeviceCommand::KeyDown(A), DeviceCommand::KeyUp(A)]
    );
    assert!(dispatcher.live_keys().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_send_key_down_while_held_emits_nothing() {
    let (dispatcher, recorder) = setup();

    dispatcher.send_key(Key::A.id(), 50.0).await.unwrap();
    let t = dispatcher.send_key_down(Key::A.id()).await.unwrap();

    assert_eq!(t, KeyTransition::AlreadyHeld);
    assert_eq!(recorder.writes().len(), 1);
}

#[tokio::test]
async fn test_explicit_down_then_up_without_timer() {
    let (dispatcher, recorder) = setup();

    dispatcher.send_key_down(Key::Shift.id()).await.unwrap();
    dispatcher.send_key_down(Key::Shift.id()).await.unwrap();
    dispatcher.send_key_up(Key::Shift.id()).await.unwrap();

    // No timer owns Shift, so every explicit call writes.
    assert_eq!(
        recorder.bytes(),
        vec![0x01, 0x81, 0x01, 0x81, 0x02, 0x81]
    );
}

#[tokio::test]
async fn test_unknown_key_fails_with_zero_bytes_written() {
    let (dispatcher, recorder) = setup();

    let result = dispatcher.send_key(1234, 100.0).await;

    assert!(matches!(result, Err(DispatchError::UnknownKey(_))));
    assert!(recorder.bytes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_is_reported_and_timer_still_clears() {
    // Arrange
    let (dispatcher, recorder) = setup();
    recorder.set_failing(true);

    // Act
    let result = dispatcher.send_key(Key::A.id(), 30.0).await;

    // Assert: caller sees the failure, but the key is not stuck.
    assert!(matches!(result, Err(DispatchError::Write(_))));
    assert_eq!(dispatcher.live_keys().await, vec![A]);

    sleep(Duration::from_millis(31)).await;
    assert!(dispatcher.live_keys().await.is_empty());

    recorder.set_failing(false);
    let again = dispatcher.send_key(Key::A.id(), 30.0).await.unwrap();
    assert_eq!(again, KeyTransition::Pressed);
}

#[tokio::test(start_paused = true)]
async fn test_send_key_racing_its_own_release_keeps_stream_balanced() {
    // Arrange: clients hammer the same key with 20 ms holds on a 10 ms grid,
    // so half of the calls land exactly on a release deadline.
    let (dispatcher, recorder) = setup();
    let dispatcher = Arc::new(dispatcher);
    let mut clients = Vec::new();
    for i in 0..40u64 {
        let dispatcher = dispatcher.clone();
        clients.push(tokio::spawn(async move {
            sleep(Duration::from_millis(i * 10)).await;
            dispatcher.send_key(Key::A.id(), 20.0).await.unwrap()
        }));
    }

    // Act
    let mut pressed = 0;
    for client in clients {
        if client.await.unwrap() == KeyTransition::Pressed {
            pressed += 1;
        }
    }
    sleep(Duration::from_millis(100)).await;

    // Assert
    let commands = recorder.commands().unwrap();
    assert_eq!(commands.len(), 2 * pressed);
    for pair in commands.chunks(2) {
        assert_eq!(pair, [DeviceCommand::KeyDown(A), DeviceCommand::KeyUp(A)]);
    }
    assert!(dispatcher.live_keys().await.is_empty());
}
