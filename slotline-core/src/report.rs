//! Bulk operation results and the response shapes handed to callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub email: String,
    pub reason: String,
}

/// What succeeded and what failed (with why), built up item by item.
///
/// Never discarded on partial failure: callers can retry `retry_list()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOperationReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedItem>,
    /// A deadline cut the run short; later items are in `failed`.
    #[serde(default)]
    pub timed_out: bool,
}

impl BulkOperationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, email: impl Into<String>) {
        self.succeeded.push(email.into());
    }

    pub fn record_failure(&mut self, email: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(FailedItem {
            email: email.into(),
            reason: reason.into(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn retry_list(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.email.clone()).collect()
    }
}

/// One batch as placed by a bulk scheduling call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub batch_number: u32,
    pub group_number: u32,
    /// Members whose record was saved. Failures are only in the report.
    pub members: Vec<String>,
    pub date: NaiveDate,
    /// Local "HH:MM" start of each stage.
    pub stage1: String,
    pub stage2: String,
    pub stage3: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScheduleResponse {
    pub total_scheduled: usize,
    pub total_batches: usize,
    pub batches: Vec<BatchSummary>,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingTimes {
    pub stage1: DateTime<Utc>,
    pub stage2: DateTime<Utc>,
    pub stage3: DateTime<Utc>,
}

impl SchedulingTimes {
    /// `None` unless every stage carries a date-time.
    pub fn from_candidate(candidate: &Candidate) -> Option<Self> {
        Some(Self {
            stage1: candidate.stage(Stage::Screening).scheduled_at?,
            stage2: candidate.stage(Stage::GroupDiscussion).scheduled_at?,
            stage3: candidate.stage(Stage::Interview).scheduled_at?,
        })
    }

    pub fn as_array(&self) -> [DateTime<Utc>; 3] {
        [self.stage1, self.stage2, self.stage3]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReassignResponse {
    pub updated: Vec<String>,
    pub failed: Vec<FailedItem>,
    pub target_group_number: u32,
    pub scheduling_times: SchedulingTimes,
}
