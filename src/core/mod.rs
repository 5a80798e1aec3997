//! Core process state shared across the codebase.

mod state;

pub use state::{
    ConnectionGuard, active_connections, is_shutdown, register_server, request_shutdown,
    setup_shutdown_handler,
};
