//! Async runtime and boundary adapters around the world kernel: the tick
//! scheduler task, message-passed kernel access, and the HTTP/WebSocket
//! server.

mod runtime;
mod server;

pub use runtime::{
    spawn_runtime, RuntimeError, RuntimeExit, RuntimeMetrics, WorldHandle,
};
pub use server::{serve, router, AppState, ServerError};
