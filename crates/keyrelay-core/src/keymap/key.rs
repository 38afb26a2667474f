//! Abstract key identifiers accepted on the RPC surface.
//!
//! A [`Key`] names a *logical* key independent of any wire encoding.  Callers
//! send the numeric id of the key (its position in the upstream RPC schema);
//! the relay resolves that id to a [`Key`] and then, through the
//! [`KeyTable`](super::KeyTable), to the one-byte code the device firmware
//! understands.
//!
//! # Wire ids
//!
//! The numeric id of each variant is its declaration index:
//!
//! | Range  | Keys                                                       |
//! |--------|------------------------------------------------------------|
//! | 0–25   | `A` … `Z`                                                  |
//! | 26–35  | `Zero` … `Nine`                                            |
//! | 36–47  | `F1` … `F12`                                               |
//! | 48–51  | `Up`, `Down`, `Left`, `Right`                              |
//! | 52–57  | `Home`, `End`, `PageUp`, `PageDown`, `Insert`, `Delete`    |
//! | 58–69  | `Ctrl` … `Alt` (controls, punctuation, modifiers)          |
//!
//! Reordering the variants changes the wire contract with every client.

use serde::{Deserialize, Serialize};

use super::KeymapError;

/// Number of [`Key`] variants.
pub const KEY_COUNT: usize = 70;

/// A logical key understood by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum Key {
    // Letters
    A = 0,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Digits
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Arrows
    Up,
    Down,
    Left,
    Right,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,

    // Controls, punctuation and modifiers
    Ctrl,
    Enter,
    Space,
    Tilde,
    Quote,
    Semicolon,
    Comma,
    Period,
    Slash,
    Esc,
    Shift,
    Alt,
}

impl Key {
    /// Every key in wire-id order.
    pub const ALL: [Key; KEY_COUNT] = {
        use Key::*;
        [
            A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
            Zero, One, Two, Three, Four, Five, Six, Seven, Eight, Nine,
            F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
            Up, Down, Left, Right,
            Home, End, PageUp, PageDown, Insert, Delete,
            Ctrl, Enter, Space, Tilde, Quote, Semicolon, Comma, Period, Slash, Esc, Shift, Alt,
        ]
    };

    /// Returns the numeric wire id of this key.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Index into per-key tables (`0..KEY_COUNT`).
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<i32> for Key {
    type Error = KeymapError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        usize::try_from(id)
            .ok()
            .and_then(|i| Key::ALL.get(i).copied())
            .ok_or(KeymapError::UnknownKey(id))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
