//! Infrastructure layer for the relay server.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyrelay_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`serial`** – the `serialport`-backed [`SerialChannel`](crate::application::device::SerialChannel),
//!   device discovery, and an in-memory recorder for tests.
//! - **`cursor`** – OS-specific [`CursorLocator`](crate::application::cursor::CursorLocator)s,
//!   selected at compile time with `#[cfg(target_os)]`, plus a fixed locator.
//! - **`rpc`** – the JSON-lines TCP listener.
//! - **`storage`** – TOML configuration.

pub mod cursor;
pub mod rpc;
pub mod serial;
pub mod storage;
