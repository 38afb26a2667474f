//! Screen positions and relative motion deltas.
//!
//! Callers address the mouse in absolute screen coordinates, but the device
//! only moves the pointer *relative* to where it is.  [`MotionDelta::between`]
//! turns a (cursor, target) pair into the signed 16-bit delta the device
//! protocol carries.

use serde::{Deserialize, Serialize};

/// An absolute position in screen space (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Relative pointer motion as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MotionDelta {
    pub dx: i16,
    pub dy: i16,
}

impl MotionDelta {
    pub const fn new(dx: i16, dy: i16) -> Self {
        Self { dx, dy }
    }

    /// Computes the motion that takes the pointer from `cursor` to `target`.
    ///
    /// Each axis saturates to the `i16` range instead of wrapping, so a target
    /// that is too far away moves the pointer as far as the protocol allows in
    /// the right direction.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keyrelay_core::domain::{MotionDelta, ScreenPoint};
    ///
    /// let d = MotionDelta::between(ScreenPoint::new(500, 400), ScreenPoint::new(683, 384));
    /// assert_eq!(d, MotionDelta::new(183, -16));
    ///
    /// let far = MotionDelta::between(ScreenPoint::new(0, 0), ScreenPoint::new(100_000, -100_000));
    /// assert_eq!(far, MotionDelta::new(i16::MAX, i16::MIN));
    /// ```
    pub fn between(cursor: ScreenPoint, target: ScreenPoint) -> Self {
        Self {
            dx: saturate(i64::from(target.x) - i64::from(cursor.x)),
            dy: saturate(i64::from(target.y) - i64::from(cursor.y)),
        }
    }
}

fn saturate(v: i64) -> i16 {
    v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

// ── Tests ─────────────────────────────────────────────────────────────────────
