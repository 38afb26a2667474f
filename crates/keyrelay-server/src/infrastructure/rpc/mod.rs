//! Newline-delimited JSON RPC over TCP.
//!
//! - **`messages`** – request and response shapes.
//! - **`server`** – accept loop, connection tasks, and the dispatch worker.

pub mod messages;
pub mod server;

pub use messages::{RpcRequest, RpcResponse};
pub use server::{bind, handle_request, run_server};
