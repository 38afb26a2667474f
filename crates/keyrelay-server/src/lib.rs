//! keyrelay-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the server do?
//!
//! It sits between RPC clients that speak in abstract keys and screen
//! coordinates and a microcontroller that emulates a USB keyboard and mouse
//! over a serial link.  For every call it:
//!
//! 1. Resolves key ids to one-byte device codes.
//! 2. Tracks which keys are held by a timed press so repeated presses do not
//!    produce spurious up/down pairs.
//! 3. Turns absolute mouse targets into relative motion using the local
//!    cursor position.
//! 4. Writes the encoded commands to the device, one sequence at a time.

/// Application layer: device link, key state, and the dispatcher.
pub mod application;

/// Infrastructure layer: serial port, cursor queries, RPC, and config.
pub mod infrastructure;
