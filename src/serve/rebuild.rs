//! Single-flight rebuild coordination.
//!
//! `trigger` runs at most one build at a time. Whatever the build's fate,
//! every completed run ends with exactly one broadcast so connected
//! browsers can pick up fixes after a failed build just as well as after
//! a clean one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::logger::{status_error, status_success};
use crate::serve::hub::{ReloadHub, ReloadSignal};
use crate::{debug, utils::plural::plural_count};

/// Outcome of one rebuild run.
#[derive(Debug, Clone)]
pub struct RebuildOutcome {
    pub succeeded: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

/// The build step, injected so the coordinator stays testable.
pub type BuildFn = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

pub struct RebuildCoordinator {
    in_flight: AtomicBool,
    hub: Arc<ReloadHub>,
    build: BuildFn,
}

impl RebuildCoordinator {
    pub fn new(hub: Arc<ReloadHub>, build: BuildFn) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            hub,
            build,
        }
    }

    /// Run a rebuild unless one is already in flight.
    ///
    /// Returns `false` when the request was dropped because of a
    /// concurrent run. On completion the outcome is logged and a reload
    /// signal is broadcast exactly once.
    pub fn trigger(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("serve"; "rebuild already in flight, dropping trigger");
            return false;
        }

        let outcome = self.run_build();
        self.in_flight.store(false, Ordering::Release);

        self.report(&outcome);
        let notified = self.hub.broadcast(ReloadSignal::Reload);
        debug!("reload"; "notified {}", plural_count(notified, "client"));
        true
    }

    fn run_build(&self) -> RebuildOutcome {
        let start = Instant::now();
        match (self.build)() {
            Ok(()) => RebuildOutcome {
                succeeded: true,
                error: None,
                duration: start.elapsed(),
            },
            Err(e) => RebuildOutcome {
                succeeded: false,
                error: Some(format!("{e:#}")),
                duration: start.elapsed(),
            },
        }
    }

    fn report(&self, outcome: &RebuildOutcome) {
        let ms = outcome.duration.as_millis();
        if outcome.succeeded {
            status_success(&format!("rebuilt in {ms} ms"));
        } else {
            let detail = outcome.error.as_deref().unwrap_or("unknown error");
            status_error(&format!("rebuild failed after {ms} ms"), detail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    fn counting_coordinator(
        hub: Arc<ReloadHub>,
        delay: Duration,
        fail: bool,
    ) -> (Arc<RebuildCoordinator>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_inner = Arc::clone(&runs);
        let coordinator = Arc::new(RebuildCoordinator::new(
            hub,
            Box::new(move || {
                runs_inner.fetch_add(1, Ordering::SeqCst);
                thread::sleep(delay);
                if fail {
                    anyhow::bail!("boom");
                }
                Ok(())
            }),
        ));
        (coordinator, runs)
    }

    #[test]
    fn test_trigger_runs_build_and_broadcasts() {
        let hub = Arc::new(ReloadHub::new());
        let sub = hub.register();
        let (coordinator, runs) = counting_coordinator(Arc::clone(&hub), Duration::ZERO, false);

        assert!(coordinator.trigger());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(sub.rx.try_recv(), Ok(ReloadSignal::Reload));
    }

    #[test]
    fn test_failed_build_still_broadcasts() {
        let hub = Arc::new(ReloadHub::new());
        let sub = hub.register();
        let (coordinator, _) = counting_coordinator(Arc::clone(&hub), Duration::ZERO, true);

        assert!(coordinator.trigger());
        assert_eq!(sub.rx.try_recv(), Ok(ReloadSignal::Reload));

        // the coordinator recovers after a failure
        assert!(coordinator.trigger());
        assert_eq!(sub.rx.try_recv(), Ok(ReloadSignal::Reload));
    }

    #[test]
    fn test_concurrent_triggers_coalesce() {
        let hub = Arc::new(ReloadHub::new());
        let (coordinator, runs) =
            counting_coordinator(hub, Duration::from_millis(150), false);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let c = Arc::clone(&coordinator);
            handles.push(thread::spawn(move || c.trigger()));
        }
        let accepted: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        // One thread won the race; the rest were dropped
        assert_eq!(accepted, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // After completion a new trigger is accepted again
        assert!(coordinator.trigger());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
