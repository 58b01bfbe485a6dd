//! slotline-core: batch and time-slot scheduling for a three-stage candidate pipeline.
//!
//! Candidates are shuffled into fixed-size batches, each batch gets a group
//! number, and batches are packed into a pipelined daily window: successive
//! batches start one stage-duration apart, rolling over to the next working
//! day when the window is full.

pub mod allocator;
pub mod bulk;
pub mod candidate;
pub mod error;
pub mod groups;
pub mod packer;
pub mod partition;
pub mod reassign;
pub mod report;
pub mod request;
pub mod stage_schedule;
pub mod store;
pub mod time;
pub mod updates;
pub mod window;

pub use allocator::{GroupNumberAllocator, MonotonicAllocator, ScanAllocator, next_group_number};
pub use bulk::{BulkScheduleOutcome, BulkScheduler};
pub use candidate::{Candidate, Stage, StageRecord, StageStatus, email_key};
pub use error::{ScheduleError, StoreError, UpdateError};
pub use groups::{GroupView, group_view, list_groups};
pub use packer::{DaySlotPacker, SlotAssignment, next_working_day};
pub use partition::partition;
pub use reassign::{GroupReassigner, ReassignOutcome};
pub use report::{
    BatchSummary, BulkOperationReport, BulkScheduleResponse, FailedItem, GroupReassignResponse,
    SchedulingTimes,
};
pub use request::{BulkScheduleRequest, GroupReassignRequest};
pub use stage_schedule::{StageSchedule, StageScheduleBuilder, batch_tag};
pub use store::{CandidateStore, InMemoryStore};
pub use updates::{StageUpdate, update_stage};
pub use window::{SchedulingWindow, WindowGeometry};

/// Reason recorded for an email that does not resolve to a candidate.
pub const REASON_NOT_FOUND: &str = "User not found";

/// Reason recorded for candidates left untouched once a deadline passes.
pub const REASON_DEADLINE: &str = "deadline exceeded";
