//! Process state tracking for serve mode.
//!
//! Two orthogonal concerns:
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `CONNECTIONS`: How many request threads are still running? (drain gating)

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Number of in-flight connection threads
static CONNECTIONS: AtomicUsize = AtomicUsize::new(0);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Request shutdown programmatically (same path as Ctrl+C).
#[allow(dead_code)]
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);

    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a server has been registered:
/// - Before `register_server()`: Sets SHUTDOWN flag, process exits immediately
/// - After `register_server()`: Graceful shutdown (unblock the accept loop;
///   the watch loop and event streams observe the flag)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        // Unblock HTTP server, or exit immediately if not yet serving
        if let Some(server) = SERVER.get() {
            server.unblock();
        } else {
            // No server registered yet (e.g., during a one-shot build)
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

// =============================================================================
// Connection tracking
// =============================================================================

/// Number of currently running connection threads
pub fn active_connections() -> usize {
    CONNECTIONS.load(Ordering::SeqCst)
}

/// RAII guard counting one in-flight connection thread.
pub struct ConnectionGuard(());

impl ConnectionGuard {
    pub fn acquire() -> Self {
        CONNECTIONS.fetch_add(1, Ordering::SeqCst);
        Self(())
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        CONNECTIONS.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_guard_counts() {
        let before = active_connections();
        {
            let _a = ConnectionGuard::acquire();
            let _b = ConnectionGuard::acquire();
            assert_eq!(active_connections(), before + 2);
        }
        assert_eq!(active_connections(), before);
    }
}
