//! Error taxonomy.
//!
//! `ScheduleError` is fatal for a whole request and is always raised before
//! any candidate is written. Per-candidate problems never become errors; they
//! are collected into a `BulkOperationReport`.

use chrono::{NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::candidate::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("candidate {0} not found")]
    NotFound(String),

    #[error("email {0} already belongs to another candidate")]
    DuplicateEmail(String),

    #[error("store backend: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "window of {window_minutes} minutes cannot fit three stages of {stage_minutes} minutes"
    )]
    WindowTooShort {
        window_minutes: u32,
        stage_minutes: u32,
    },

    #[error("no candidates to schedule")]
    NoCandidates,

    #[error("group {0} has no members")]
    TargetNotFound(u32),

    #[error("group {group} has no date-time for its {stage} stage")]
    IncompleteTargetSchedule { group: u32, stage: Stage },

    #[error("batch {batch} starting at {start} would run past midnight")]
    CrossesMidnight { batch: u32, start: NaiveTime },

    #[error("local time {local} does not exist or is ambiguous in {tz}")]
    AmbiguousLocalTime { local: NaiveDateTime, tz: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of a single-candidate stage update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("candidate {0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("domain '{domain}' is already assigned to candidate {id}")]
    Duplicate { id: String, domain: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
