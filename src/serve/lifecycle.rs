//! Startup and shutdown checks for the dev server.

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};

use crate::core::active_connections;
use crate::debug;

/// How long shutdown waits for in-flight responses to finish.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Confirm the output directory exists and looks like a built site.
pub fn verify_output_dir(output: &Path) -> Result<()> {
    if !output.is_dir() {
        bail!("output directory missing after build: {}", output.display());
    }
    if !output.join("index.html").is_file() {
        bail!(
            "output directory has no index.html: {}",
            output.display()
        );
    }
    Ok(())
}

/// Check the port is free by binding and immediately releasing it.
///
/// The probe gives a clear error before the real server bind; the small
/// window between release and re-bind is acceptable for a dev tool.
pub fn probe_port(interface: IpAddr, port: u16) -> Result<()> {
    let addr = SocketAddr::new(interface, port);
    TcpListener::bind(addr)
        .with_context(|| format!("port {port} is unavailable on {interface}"))?;
    Ok(())
}

/// Block until in-flight connections drain or the grace period expires.
pub fn drain_connections() {
    let deadline = Instant::now() + DRAIN_GRACE;
    while active_connections() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(25));
    }
    let remaining = active_connections();
    if remaining > 0 {
        debug!("serve"; "grace period expired with {remaining} connections open");
    }
}
