//! Progress event and snapshot types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-stage completed/total breakdown embedded in a [`ProgressSnapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBreakdown {
    pub completed: u64,
    pub total: u64,
}

/// A heterogeneous scanner progress event. Modeled as a tagged union rather than a
/// dynamically-typed payload: the source mixes string and map payloads, but the Aggregator only
/// ever needs these fields, so a plain struct of `Option`s captures every valid shape exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressEvent {
    #[must_use]
    pub fn for_stage(stage: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_stage_total(mut self, index: u64, total: u64) -> Self {
        self.stage_index = Some(index);
        self.stage_total = Some(total);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_overall_total(mut self, total: u64) -> Self {
        self.overall_total = Some(total);
        self
    }
}

/// Embedded in `RepositoryStatus` while a Worker is in a work phase. Invariant: `processed <=
/// observed_total`; `percentage` is a pure function of `processed` and `observed_total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub stage: String,
    pub processed: u64,
    pub observed_total: u64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub stage_breakdown: HashMap<String, StageBreakdown>,
}

impl ProgressSnapshot {
    /// The synthetic terminal snapshot emitted by `finalize()`.
    #[must_use]
    pub fn finalizing(total_processed: u64) -> Self {
        Self {
            stage: "finalizing".to_string(),
            processed: total_processed,
            observed_total: total_processed.max(1),
            percentage: 100.0,
            current_file_name: None,
            message: None,
            stage_breakdown: HashMap::new(),
        }
    }
}
