//! Filesystem event classification and debouncing.
//!
//! Editors produce bursts of events per save. The debouncer coalesces a
//! burst into one batch: the quiet-period timer re-arms on every event and
//! the batch is released only once no event has arrived for the full
//! period. There is no upper bound on how long a continuous stream of
//! events can hold a batch back.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use rustc_hash::FxHashMap;

/// Quiet period a batch must sit through before release.
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Sleep horizon when no changes are pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86_400);

/// The kind of change observed for a path, post-filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Map a notify event to a change kind, or `None` for events that can
/// never affect build output (metadata touches, access notifications).
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(CreateKind::File | CreateKind::Folder | CreateKind::Any) => {
            Some(ChangeKind::Created)
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(RemoveKind::File | RemoveKind::Folder | RemoveKind::Any) => {
            Some(ChangeKind::Removed)
        }
        _ => None,
    }
}

/// Editor scratch files that should never trigger a rebuild.
pub fn is_temp_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') || name.ends_with('~') {
        return true;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
    )
}

/// Coalesces change events into rebuild batches.
pub struct Debouncer {
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Record a change and re-arm the quiet-period timer.
    ///
    /// A later event for the same path overwrites the recorded kind.
    pub fn add(&mut self, path: PathBuf, kind: ChangeKind) {
        self.changes.insert(path, kind);
        self.last_event = Some(Instant::now());
    }

    pub fn has_pending(&self) -> bool {
        !self.changes.is_empty()
    }

    /// True once the pending batch has sat quiet for the full period.
    pub fn is_ready(&self) -> bool {
        match self.last_event {
            Some(at) => self.has_pending() && at.elapsed() >= QUIET_PERIOD,
            None => false,
        }
    }

    /// Release the batch if ready, resetting the debouncer.
    pub fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        let mut batch: Vec<_> = std::mem::take(&mut self.changes).into_iter().collect();
        batch.sort();
        Some(batch)
    }

    /// How long the event loop may sleep before the batch could be ready.
    pub fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(at) if self.has_pending() => QUIET_PERIOD.saturating_sub(at.elapsed()),
            _ => IDLE_SLEEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_empty_debouncer_is_never_ready() {
        let d = Debouncer::new();
        assert!(!d.is_ready());
        assert_eq!(d.sleep_duration(), IDLE_SLEEP);
    }

    #[test]
    fn test_burst_coalesces_into_one_batch() {
        let mut d = Debouncer::new();
        d.add(PathBuf::from("a.md"), ChangeKind::Created);
        d.add(PathBuf::from("a.md"), ChangeKind::Modified);
        d.add(PathBuf::from("b.md"), ChangeKind::Modified);
        assert!(!d.is_ready());

        sleep(QUIET_PERIOD + Duration::from_millis(50));
        let batch = d.take_if_ready().unwrap();
        assert_eq!(batch.len(), 2);
        // last event for a path wins
        assert!(batch.contains(&(PathBuf::from("a.md"), ChangeKind::Modified)));
        assert!(!d.has_pending());
        assert!(d.take_if_ready().is_none());
    }

    #[test]
    fn test_new_event_rearms_timer() {
        let mut d = Debouncer::new();
        d.add(PathBuf::from("a.md"), ChangeKind::Modified);
        sleep(Duration::from_millis(200));
        d.add(PathBuf::from("a.md"), ChangeKind::Modified);
        // 200ms after first event but only just after the second
        assert!(!d.is_ready());
        sleep(QUIET_PERIOD + Duration::from_millis(50));
        assert!(d.is_ready());
    }

    #[test]
    fn test_sleep_duration_counts_down() {
        let mut d = Debouncer::new();
        d.add(PathBuf::from("a.md"), ChangeKind::Modified);
        let remaining = d.sleep_duration();
        assert!(remaining <= QUIET_PERIOD);
        assert!(remaining > Duration::from_millis(100));
    }

    #[test]
    fn test_temp_files() {
        assert!(is_temp_file(Path::new("posts/.draft.md.swp")));
        assert!(is_temp_file(Path::new("posts/draft.md~")));
        assert!(is_temp_file(Path::new("posts/draft.md.bak")));
        assert!(is_temp_file(Path::new("posts/draft.tmp")));
        assert!(!is_temp_file(Path::new("posts/draft.md")));
        assert!(!is_temp_file(Path::new("posts/notes.txt")));
    }

    #[test]
    fn test_metadata_events_filtered() {
        use notify::event::MetadataKind;
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            None
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(change_kind(&EventKind::Access(notify::event::AccessKind::Any)), None);
    }
}
