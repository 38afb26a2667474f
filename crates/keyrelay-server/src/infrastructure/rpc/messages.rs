//! JSON message types for the RPC listener.
//!
//! Each request is one JSON object on its own line, tagged by `"method"`:
//!
//! ```json
//! {"method":"init","seed":[1,2,3]}
//! {"method":"send","key":0,"down_ms":100.0}
//! {"method":"send_up","key":0}
//! {"method":"send_down","key":0}
//! {"method":"send_mouse","width":1920,"height":1080,"x":683,"y":384,"action":"click"}
//! ```
//!
//! Each response is one JSON object on its own line:
//!
//! ```json
//! {"ok":true}
//! {"ok":true,"mouse_coordinate":"screen"}
//! {"ok":false,"error":"unknown key id: 999"}
//! ```

use keyrelay_core::domain::{CoordinateMode, MouseAction};
use serde::{Deserialize, Serialize};

/// A request from an RPC client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RpcRequest {
    /// Handshake.  The seed is opaque: any JSON value (bytes as an array,
    /// a base64 string, a number) is accepted and ignored.
    Init {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<serde_json::Value>,
    },

    /// Timed key press.
    Send { key: i32, down_ms: f32 },

    SendUp { key: i32 },

    SendDown { key: i32 },

    /// Pointer move, optionally followed by a click or scroll.
    /// `width`/`height` describe the client's view and are informational.
    SendMouse {
        #[serde(default)]
        width: i32,
        #[serde(default)]
        height: i32,
        x: i32,
        y: i32,
        action: MouseAction,
    },
}

/// Reply to one [`RpcRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub ok: bool,

    /// Only set in reply to `init`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_coordinate: Option<CoordinateMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn ack() -> Self {
        Self {
            ok: true,
            mouse_coordinate: None,
            error: None,
        }
    }

    pub fn init(mode: CoordinateMode) -> Self {
        Self {
            mouse_coordinate: Some(mode),
            ..Self::ack()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            mouse_coordinate: None,
            error: Some(message.into()),
        }
    }
}
