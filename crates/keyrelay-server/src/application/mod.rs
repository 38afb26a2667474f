//! Application layer use cases for the relay server.
//!
//! - **`device`** – the [`DeviceLink`](device::DeviceLink) that serialises
//!   every write to the input device, and the [`SerialChannel`](device::SerialChannel)
//!   seam that infrastructure implements.
//! - **`key_state`** – per-key timers: timed presses, explicit up/down, and the
//!   "no-op while held" rule.
//! - **`cursor`** – the [`CursorLocator`](cursor::CursorLocator) capability.
//! - **`dispatch`** – the [`CommandDispatcher`](dispatch::CommandDispatcher),
//!   one method per RPC call.
//!
//! **Dependency rule**: nothing in here imports `crate::infrastructure`.

pub mod cursor;
pub mod device;
pub mod dispatch;
pub mod key_state;
