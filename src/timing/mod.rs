use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Well-known timer labels the result harvesting looks for.
///
/// Planners are free to create additional labels; they show up in the
/// [`TimingReport`] but not in the CSV schema.
pub mod labels {
    pub const SETUP_TOTAL: &str = "total_time_setup";
    pub const SOLVE_TOTAL: &str = "total_time_solve";
    pub const DECOMPOSITION: &str = "time_decomposition";
    pub const POLYGON_ADJACENCY: &str = "time_polygon_adjacency";
    pub const POLY_OFFSET: &str = "time_poly_offset";
    pub const SWEEP_GRAPH: &str = "total_time_sweep_graph";
    pub const SETUP_SOLVER: &str = "total_time_setup_solver";
    pub const LINE_SWEEPS: &str = "time_line_sweeps";
    pub const NODE_CREATION: &str = "time_node_creation";
    pub const PRUNING: &str = "time_pruning";
    pub const EDGE_CREATION: &str = "time_edge_creation";
}

#[derive(Debug, Clone, Copy, Default)]
struct TimerEntry {
    starts: u64,
    total: Duration,
}

/// Named wall-clock timers for one benchmark run.
///
/// The context is created by the orchestrator and passed by reference
/// through the planner's setup/solve call chain, so sub-phases can hang
/// their own timers off the same table. Repeated acquisitions under one
/// label accumulate additively. Interior mutability sits behind a mutex,
/// so a context shared across threads stays consistent.
#[derive(Debug, Default)]
pub struct TimingContext {
    timers: Mutex<BTreeMap<String, TimerEntry>>,
}

impl TimingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accumulating under `label`.
    ///
    /// The returned guard commits its elapsed time when explicitly stopped
    /// or when its scope ends, whichever comes first.
    pub fn scoped(&self, label: impl Into<String>) -> ScopedTimer<'_> {
        ScopedTimer {
            ctx: self,
            label: label.into(),
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Clear every timer entry.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Snapshot the accumulated timers into an immutable report.
    pub fn collect(&self) -> TimingReport {
        let timers = self.lock();
        TimingReport {
            entries: timers
                .iter()
                .map(|(label, entry)| {
                    (
                        label.clone(),
                        TimerStats {
                            starts: entry.starts,
                            total: entry.total,
                        },
                    )
                })
                .collect(),
        }
    }

    fn commit(&self, label: &str, elapsed: Duration) {
        let mut timers = self.lock();
        let entry = timers.entry(label.to_string()).or_default();
        entry.starts += 1;
        entry.total += elapsed;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, TimerEntry>> {
        // A poisoned lock only means some guard panicked mid-commit; the
        // table itself is still a valid map.
        self.timers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Timer guard tied to a lexical scope.
///
/// Commits the elapsed time on [`stop`](Self::stop) or on drop, so early
/// failure returns still release the timer.
#[derive(Debug)]
pub struct ScopedTimer<'a> {
    ctx: &'a TimingContext,
    label: String,
    start: Instant,
    stopped: bool,
}

impl ScopedTimer<'_> {
    /// Stop before the end of the owning scope.
    pub fn stop(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.ctx.commit(&self.label, self.start.elapsed());
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Aggregate numbers for one timer label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStats {
    pub starts: u64,
    pub total: Duration,
}

impl TimerStats {
    pub fn mean(&self) -> Duration {
        if self.starts == 0 {
            Duration::ZERO
        } else {
            self.total / self.starts as u32
        }
    }
}

/// Immutable snapshot of a [`TimingContext`].
///
/// Labels that never ran read as zero rather than erroring, which is what
/// the harvesting step relies on for planners that skip a phase.
#[derive(Debug, Clone, Default)]
pub struct TimingReport {
    entries: BTreeMap<String, TimerStats>,
}

impl TimingReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, label: &str) -> Option<TimerStats> {
        self.entries.get(label).copied()
    }

    /// Total accumulated seconds under `label`, zero if it never ran.
    pub fn seconds(&self, label: &str) -> f64 {
        self.entries
            .get(label)
            .map(|stats| stats.total.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// How many times a timer was acquired under `label`.
    pub fn starts(&self, label: &str) -> u64 {
        self.entries.get(label).map(|stats| stats.starts).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TimerStats)> + '_ {
        self.entries
            .iter()
            .map(|(label, stats)| (label.as_str(), *stats))
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, stats) in &self.entries {
            writeln!(
                f,
                "{label}: {} starts, total {:.6} s, mean {:.6} s",
                stats.starts,
                stats.total.as_secs_f64(),
                stats.mean().as_secs_f64()
            )?;
        }
        Ok(())
    }
}
