//! Filesystem watching for the dev loop.
//!
//! Watches are per-directory and non-recursive so coverage is explicit:
//! when a new directory appears under a watched root, its whole subtree
//! is added before the event is passed on to the debouncer. Events under
//! the output directory are suppressed to keep builds from re-triggering
//! themselves.

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as tokio_mpsc;

use crate::config::SiteConfig;
use crate::core::is_shutdown;
use crate::serve::debounce::{ChangeKind, Debouncer, change_kind, is_temp_file};
use crate::serve::rebuild::RebuildCoordinator;
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Cap on event-loop sleeps so the shutdown flag is polled promptly.
const SHUTDOWN_POLL: Duration = Duration::from_millis(500);

pub struct FsWatcher {
    watcher: RecommendedWatcher,
    events: tokio_mpsc::Receiver<notify::Result<Event>>,
    debouncer: Debouncer,
    coordinator: Arc<RebuildCoordinator>,
    /// Canonicalized output directory, for event suppression.
    output_dir: PathBuf,
    root: PathBuf,
}

impl FsWatcher {
    /// Install watches over every configured source root.
    ///
    /// Fails when any root cannot be covered; a dev loop with silent
    /// blind spots is worse than no dev loop.
    pub fn new(config: &SiteConfig, coordinator: Arc<RebuildCoordinator>) -> Result<Self> {
        let (bridge_tx, bridge_rx) = mpsc::channel();
        let (event_tx, event_rx) = tokio_mpsc::channel(256);

        // notify delivers on its own thread; hop through a std channel so
        // the callback never blocks on the async side
        std::thread::spawn(move || {
            while let Ok(msg) = bridge_rx.recv() {
                if event_tx.blocking_send(msg).is_err() {
                    break;
                }
            }
        });

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = bridge_tx.send(res);
            },
            notify::Config::default(),
        )
        .context("creating filesystem watcher")?;

        let mut watched_dirs = 0;
        for root in config.build.watch_roots() {
            watched_dirs += add_dir_tree(&mut watcher, &root)
                .with_context(|| format!("watching {}", root.display()))?;
        }
        debug!("watch"; "covering {}", plural_count(watched_dirs, "directory"));

        let output_dir = config
            .build
            .output
            .canonicalize()
            .unwrap_or_else(|_| config.build.output.clone());

        Ok(Self {
            watcher,
            events: event_rx,
            debouncer: Debouncer::new(),
            coordinator,
            output_dir,
            root: config.root.clone(),
        })
    }

    /// Drive the watch loop until shutdown.
    pub async fn run(mut self) {
        loop {
            if is_shutdown() {
                break;
            }

            let sleep_for = self.debouncer.sleep_duration().min(SHUTDOWN_POLL);
            tokio::select! {
                biased;
                maybe = self.events.recv() => match maybe {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => debug!("watch"; "watch error: {e}"),
                    None => break,
                },
                _ = tokio::time::sleep(sleep_for) => {}
            }

            if is_shutdown() {
                break;
            }
            if let Some(batch) = self.debouncer.take_if_ready() {
                log!("watch"; "{} changed, rebuilding", plural_count(batch.len(), "path"));
                let coordinator = Arc::clone(&self.coordinator);
                tokio::task::block_in_place(move || {
                    coordinator.trigger();
                });
            }
        }
        debug!("watch"; "watch loop stopped");
    }

    fn handle_event(&mut self, event: Event) {
        let Some(kind) = change_kind(&event.kind) else {
            return;
        };

        for path in event.paths {
            if self.is_output_path(&path) {
                continue;
            }
            if is_temp_file(&path) {
                debug!("watch"; "ignoring temp file {}", path.display());
                continue;
            }

            // New directories must be covered before anything inside them
            // can produce events
            if kind == ChangeKind::Created && path.is_dir() {
                match add_dir_tree(&mut self.watcher, &path) {
                    Ok(n) => debug!("watch"; "extended coverage by {}", plural_count(n, "directory")),
                    Err(e) => log!("watch"; "failed to watch {}: {e:#}", path.display()),
                }
            }

            debug!("watch"; "{} {}", kind.label(), self.display_path(&path));
            self.debouncer.add(path, kind);
        }
    }

    fn is_output_path(&self, path: &Path) -> bool {
        if path.starts_with(&self.output_dir) {
            return true;
        }
        // notify may report pre-canonicalized paths
        path.canonicalize()
            .map(|p| p.starts_with(&self.output_dir))
            .unwrap_or(false)
    }

    fn display_path<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}

/// Watch `root` and every directory beneath it, non-recursively each.
fn add_dir_tree(watcher: &mut RecommendedWatcher, root: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in jwalk::WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", dir.display()))?;
        count += 1;
    }
    Ok(count)
}
