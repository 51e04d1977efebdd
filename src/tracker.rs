//! Observability seams: run tracking, workunits and invalidation reports.
//!
//! The reporting subsystem itself is an external collaborator; this module
//! only defines the contract the orchestrator needs: demarcating named
//! phases and recording the run's root outcome.

use std::sync::Arc;

/// The recorded outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// The run-tracking collaborator.
///
/// The orchestrator records the root outcome at most once per run, and
/// brackets the setup phases in named workunits through [`workunit`].
pub trait RunTracker: Send + Sync {
    fn start_workunit(&self, name: &str);
    fn end_workunit(&self, name: &str);
    fn set_root_outcome(&self, outcome: Outcome);
}

/// RAII guard pairing a workunit's start with its end, with a tracing span
/// entered for the duration.
pub struct WorkUnit<'a> {
    tracker: &'a dyn RunTracker,
    name: &'static str,
    _span: tracing::span::EnteredSpan,
}

/// Demarcates a named unit of work. The unit ends when the guard drops.
pub fn workunit<'a>(tracker: &'a dyn RunTracker, name: &'static str) -> WorkUnit<'a> {
    tracker.start_workunit(name);
    let span = tracing::info_span!("workunit", unit = name).entered();
    WorkUnit {
        tracker,
        name,
        _span: span,
    }
}

impl Drop for WorkUnit<'_> {
    fn drop(&mut self) {
        self.tracker.end_workunit(self.name);
    }
}

/// Tracker that forwards everything to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl RunTracker for LogTracker {
    fn start_workunit(&self, name: &str) {
        tracing::debug!("workunit '{name}' started");
    }

    fn end_workunit(&self, name: &str) {
        tracing::debug!("workunit '{name}' finished");
    }

    fn set_root_outcome(&self, outcome: Outcome) {
        tracing::info!("run outcome: {outcome:?}");
    }
}

/// A deferred report over the invalidation activity of a run, finalized
/// after the engine returns.
pub trait InvalidationReport: Send + Sync {
    fn report(&self);
}

/// The reporting collaborator consulted once during setup, after the quiet
/// level of the run is known.
pub trait Reporting: Send + Sync {
    fn update_reporting(&self, quiet: bool) -> Option<Arc<dyn InvalidationReport>>;
}

/// Reporting that produces no invalidation report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporting;

impl Reporting for NullReporting {
    fn update_reporting(&self, _quiet: bool) -> Option<Arc<dyn InvalidationReport>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl RunTracker for Recording {
        fn start_workunit(&self, name: &str) {
            self.events.lock().unwrap().push(format!("start {name}"));
        }

        fn end_workunit(&self, name: &str) {
            self.events.lock().unwrap().push(format!("end {name}"));
        }

        fn set_root_outcome(&self, _: Outcome) {}
    }

    #[test]
    fn test_workunit_brackets() {
        let tracker = Recording::default();
        {
            let _unit = workunit(&tracker, "parse");
            tracker.events.lock().unwrap().push("work".into());
        }
        assert_eq!(
            *tracker.events.lock().unwrap(),
            vec!["start parse", "work", "end parse"],
        );
    }
}
