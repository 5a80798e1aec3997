//! Development server: build, watch, rebuild, reload.
//!
//! The moving pieces and how they hang together:
//!
//! - an initial full build, fatal if it fails;
//! - a filesystem watcher feeding a debouncer on its own thread;
//! - a rebuild coordinator that runs at most one build at a time and
//!   broadcasts a reload after every completed run;
//! - a reload hub fanning that broadcast out to SSE subscribers;
//! - a thread-per-connection HTTP loop serving the output directory with
//!   the reload snippet injected into HTML.

mod debounce;
mod hub;
mod lifecycle;
mod path;
mod rebuild;
mod response;
mod sse;
mod watch;

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tiny_http::{Method, Server};

use crate::config::SiteConfig;
use crate::content;
use crate::core::{ConnectionGuard, is_shutdown, register_server};
use crate::serve::hub::ReloadHub;
use crate::serve::rebuild::RebuildCoordinator;
use crate::serve::watch::FsWatcher;
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Run the dev server until interrupted.
pub fn serve(config: Arc<SiteConfig>) -> Result<()> {
    let stats = content::build_site(&config).context("initial build failed")?;
    log!(
        "serve";
        "built {} in {} ms",
        plural_count(stats.posts, "post"),
        stats.duration.as_millis()
    );

    lifecycle::verify_output_dir(&config.build.output)?;

    let addr = SocketAddr::new(config.serve.interface, config.serve.port);
    lifecycle::probe_port(config.serve.interface, config.serve.port)?;
    let server = Arc::new(
        Server::http(addr).map_err(|e| anyhow::anyhow!("binding {addr}: {e}"))?,
    );
    register_server(Arc::clone(&server));

    let hub = Arc::new(ReloadHub::new());

    let watcher_thread = if config.serve.watch {
        let build_config = Arc::clone(&config);
        let coordinator = Arc::new(RebuildCoordinator::new(
            Arc::clone(&hub),
            Box::new(move || content::build_site(&build_config).map(|_| ())),
        ));
        let watcher = FsWatcher::new(&config, coordinator)?;
        Some(spawn_watch_loop(watcher))
    } else {
        debug!("serve"; "file watching disabled");
        None
    };

    log!("serve"; "serving at http://{addr}{}", config.site.base_path);
    run_request_loop(&server, &config, &hub);

    // Interrupted: wake streams, stop the watcher, drain connections
    log!("serve"; "shutting down");
    hub.shutdown();
    if let Some(handle) = watcher_thread {
        let _ = handle.join();
    }
    lifecycle::drain_connections();
    Ok(())
}

/// Dedicated thread driving the async watch loop.
///
/// Builds run inside it via `block_in_place`, so it needs a second worker
/// to keep timers and event intake live during a build.
fn spawn_watch_loop(watcher: FsWatcher) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .expect("building watch runtime");
        runtime.block_on(watcher.run());
    })
}

/// Accept loop: one short-lived thread per request.
fn run_request_loop(server: &Arc<Server>, config: &Arc<SiteConfig>, hub: &Arc<ReloadHub>) {
    for request in server.incoming_requests() {
        if is_shutdown() {
            response::respond_unavailable(request);
            break;
        }

        let config = Arc::clone(config);
        let hub = Arc::clone(hub);
        thread::spawn(move || {
            let _guard = ConnectionGuard::acquire();
            handle_request(request, &config, hub);
        });
    }
}

fn handle_request(request: tiny_http::Request, config: &SiteConfig, hub: Arc<ReloadHub>) {
    if *request.method() != Method::Get && *request.method() != Method::Head {
        let response = tiny_http::Response::from_string("method not allowed")
            .with_status_code(405);
        let _ = request.respond(response);
        return;
    }

    let url = request.url().to_string();
    debug!("serve"; "{} {url}", request.method());

    if url == "/__reload" || url.starts_with("/__reload?") {
        return sse::respond_event_stream(request, hub);
    }

    // Requests arrive with the base path prefix; the output tree is rooted
    // without it
    let site_relative = strip_base_path(&url, &config.site.base_path);

    match path::resolve(&config.build.output, site_relative) {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request, Some(&config.build.output)),
    }
}

/// Strip the configured base path prefix from a request URL.
fn strip_base_path<'a>(url: &'a str, base_path: &str) -> &'a str {
    if base_path == "/" {
        return url;
    }
    match url.strip_prefix(base_path.trim_end_matches('/')) {
        Some("") => "/",
        Some(rest) => rest,
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_base_path_root() {
        assert_eq!(strip_base_path("/writings/", "/"), "/writings/");
    }

    #[test]
    fn test_strip_base_path_prefix() {
        assert_eq!(strip_base_path("/blog/writings/", "/blog/"), "/writings/");
        assert_eq!(strip_base_path("/blog", "/blog/"), "/");
        assert_eq!(strip_base_path("/other/", "/blog/"), "/other/");
    }
}
