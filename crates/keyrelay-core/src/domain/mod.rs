//! Domain types shared by the relay: mouse actions, coordinate conventions,
//! and motion arithmetic.
//!
//! Nothing in here performs I/O.

pub mod generation;
pub mod motion;

use serde::{Deserialize, Serialize};

pub use generation::GenerationCounter;
pub use motion::{MotionDelta, ScreenPoint};

/// What a mouse request should do once the pointer reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseAction {
    /// Move only.
    Move,
    /// Move, settle, then left-click.
    Click,
    /// Move, settle, then scroll down.
    ScrollDown,
}

/// Coordinate convention a relay expects for mouse targets.
///
/// This server queries the local cursor position itself, so it always
/// reports [`CoordinateMode::Screen`].  `Relative` exists because clients
/// share the enum with relays that cannot see the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateMode {
    Screen,
    Relative,
}
