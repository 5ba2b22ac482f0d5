//! Progress Aggregator: merges heterogeneous per-file scanner events into one monotonic
//! [`ProgressSnapshot`] per repository. One instance lives for the lifetime of a single Worker's
//! scan phase; the Worker feeds every [`ProgressEvent`] from every scanner pass through
//! [`ProgressAggregator::update`] and writes the returned snapshot to the repo status file.

use std::collections::{HashMap, HashSet};

use scanner_core::{ProgressEvent, ProgressSnapshot, StageBreakdown};

/// Stateful accumulator implementing the monotonic progress update rule. Invariants upheld across
/// calls to `update`: `observed_total` is non-decreasing and `processed <= observed_total`.
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    processed: u64,
    stage_totals: HashMap<String, u64>,
    stage_positions: HashMap<String, u64>,
    observed_total: u64,
    overall_total_hint: u64,
    seen: HashSet<(String, Option<String>)>,
    current_stage: String,
    current_file: Option<String>,
    message: Option<String>,
}

impl ProgressAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the resulting snapshot.
    pub fn update(&mut self, event: &ProgressEvent) -> ProgressSnapshot {
        let stage_key = event.stage.clone().unwrap_or_default();

        // 1. Normalize: absent path uses a sentinel key so repeated
        // stage-only events dedup against each other, not against the first one.
        let dedup_key = (stage_key.clone(), event.path.clone());

        // 2. Raise stage total/position monotonically.
        if let Some(total) = event.stage_total {
            let entry = self.stage_totals.entry(stage_key.clone()).or_insert(0);
            *entry = (*entry).max(total);
        }
        if let Some(index) = event.stage_index {
            let entry = self.stage_positions.entry(stage_key.clone()).or_insert(0);
            *entry = (*entry).max(index);
        }

        // 3. Raise overall-total hint monotonically if present.
        if let Some(hint) = event.overall_total {
            self.overall_total_hint = self.overall_total_hint.max(hint);
        }

        // 4. If (stage, path) is unseen, add to set and increment processed.
        if self.seen.insert(dedup_key) {
            self.processed += 1;
        }

        // 5. Recompute observed-total by precedence.
        let stage_total_sum: u64 = self.stage_totals.values().sum();
        self.observed_total = if self.overall_total_hint > 0 {
            self.overall_total_hint.max(self.processed).max(1)
        } else if stage_total_sum > 0 {
            stage_total_sum.max(self.processed).max(1)
        } else {
            self.observed_total.max(self.processed).max(1)
        };

        if let Some(stage) = &event.stage {
            self.current_stage = stage.clone();
        }
        if event.path.is_some() {
            self.current_file = event.path.clone();
        }
        if event.message.is_some() {
            self.message = event.message.clone();
        }

        self.snapshot()
    }

    /// Current snapshot without mutating state; `percentage` is always a pure function of
    /// `processed`/`observed_total`.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        #[allow(clippy::cast_precision_loss)]
        let percentage = (self.processed as f64 / self.observed_total as f64 * 100.0).clamp(0.0, 100.0);

        let stage_breakdown = self
            .stage_totals
            .keys()
            .chain(self.stage_positions.keys())
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|stage| {
                let breakdown = StageBreakdown {
                    completed: self.stage_positions.get(stage).copied().unwrap_or(0),
                    total: self.stage_totals.get(stage).copied().unwrap_or(0),
                };
                (stage.clone(), breakdown)
            })
            .collect();

        ProgressSnapshot {
            stage: self.current_stage.clone(),
            processed: self.processed,
            observed_total: self.observed_total,
            percentage,
            current_file_name: self.current_file.clone(),
            message: self.message.clone(),
            stage_breakdown,
        }
    }

    /// Emit the synthetic terminal snapshot.
    pub fn finalize(&mut self) -> ProgressSnapshot {
        self.current_stage = "finalizing".to_string();
        self.current_file = None;
        self.observed_total = self.processed.max(1);
        ProgressSnapshot::finalizing(self.processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(stage: &str, total: u64, index: u64, path: &str) -> ProgressEvent {
        ProgressEvent::for_stage(stage)
            .with_stage_total(index, total)
            .with_path(path)
    }

    /// A mixed import/api_calls event sequence across two stages.
    #[test]
    fn mixed_stage_sequence_reaches_full_percentage() {
        let mut agg = ProgressAggregator::new();
        agg.update(&event("imports", 3, 1, "a.py"));
        agg.update(&event("imports", 3, 2, "b.py"));
        agg.update(&event("imports", 3, 3, "c.py"));
        agg.update(&event("api_calls", 2, 1, "a.py"));
        let last = agg.update(&event("api_calls", 2, 2, "b.py"));

        assert_eq!(last.observed_total, 5);
        assert_eq!(last.processed, 5);
        assert!((last.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn finalize_reports_full_percentage() {
        let mut agg = ProgressAggregator::new();
        agg.update(&event("imports", 2, 1, "a.py"));
        let snap = agg.finalize();
        assert_eq!(snap.stage, "finalizing");
        assert!((snap.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_event_does_not_double_count() {
        let mut agg = ProgressAggregator::new();
        agg.update(&event("imports", 3, 1, "a.py"));
        let snap = agg.update(&event("imports", 3, 1, "a.py"));
        assert_eq!(snap.processed, 1);
    }

    /// Events where `path` is absent must not double-count against each
    /// other once their stage/index already differ.
    #[test]
    fn path_absent_events_do_not_double_count_identical_repeats() {
        let mut agg = ProgressAggregator::new();
        let e = ProgressEvent::for_stage("infrastructure").with_stage_total(1, 4);
        agg.update(&e);
        let snap = agg.update(&e);
        assert_eq!(snap.processed, 1);
    }

    #[test]
    fn overall_total_hint_takes_precedence_over_stage_sum() {
        let mut agg = ProgressAggregator::new();
        let e = ProgressEvent::for_stage("imports")
            .with_stage_total(1, 2)
            .with_path("a.py")
            .with_overall_total(100);
        let snap = agg.update(&e);
        assert_eq!(snap.observed_total, 100);
    }

    #[test]
    fn observed_total_never_decreases_when_hint_drops() {
        let mut agg = ProgressAggregator::new();
        agg.update(&ProgressEvent::for_stage("a").with_path("x").with_overall_total(50));
        let snap = agg.update(&ProgressEvent::for_stage("a").with_path("y").with_overall_total(10));
        assert_eq!(snap.observed_total, 50);
    }
}
