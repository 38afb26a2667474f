//! Serial link adapters.
//!
//! - **`port`** – [`SerialPortChannel`], the real device via `serialport`.
//! - **`discovery`** – picks the device port when none is configured.
//! - **`mock`** – [`RecordingChannel`], an in-memory recorder for tests.

pub mod discovery;
pub mod mock;
pub mod port;

pub use discovery::{discover_port, rank_port, select_port};
pub use mock::RecordingChannel;
pub use port::SerialPortChannel;
