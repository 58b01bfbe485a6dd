//! Bulk scheduling: resolve, partition, pack, build, then write.
//!
//! Configuration problems fail the whole call before anything is written.
//! Per-candidate problems (unknown email, failed save) land in the report and
//! the run continues. Saves happen in batch order, then member order, and
//! already-saved candidates are never rolled back.

use std::collections::HashSet;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::allocator::GroupNumberAllocator;
use crate::candidate::{Candidate, email_key};
use crate::error::ScheduleError;
use crate::packer::DaySlotPacker;
use crate::partition::partition;
use crate::report::{BatchSummary, BulkOperationReport, BulkScheduleResponse};
use crate::request::BulkScheduleRequest;
use crate::stage_schedule::{StageSchedule, StageScheduleBuilder, batch_tag};
use crate::store::CandidateStore;
use crate::window::SchedulingWindow;
use crate::{REASON_DEADLINE, REASON_NOT_FOUND};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkScheduleOutcome {
    pub report: BulkOperationReport,
    pub batches: Vec<BatchSummary>,
}

impl BulkScheduleOutcome {
    pub fn to_response(&self) -> BulkScheduleResponse {
        BulkScheduleResponse {
            total_scheduled: self.report.succeeded.len(),
            total_batches: self.batches.len(),
            batches: self.batches.clone(),
            failed: self.report.failed.clone(),
        }
    }
}

/// A batch with its timing decided but nothing written yet.
struct PlannedBatch {
    batch_number: u32,
    members: Vec<Candidate>,
    schedule: StageSchedule,
}

pub struct BulkScheduler<'a, S: CandidateStore + ?Sized, A: GroupNumberAllocator + ?Sized> {
    store: &'a S,
    allocator: &'a A,
    rng: StdRng,
    deadline: Option<Instant>,
}

impl<'a, S: CandidateStore + ?Sized, A: GroupNumberAllocator + ?Sized> BulkScheduler<'a, S, A> {
    pub fn new(store: &'a S, allocator: &'a A) -> Self {
        Self {
            store,
            allocator,
            rng: StdRng::from_os_rng(),
            deadline: None,
        }
    }

    /// Fix the shuffle so batch membership is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Stop writing once `deadline` passes; the partial report is still returned.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn schedule_request(
        &mut self,
        request: &BulkScheduleRequest,
        timezone: chrono_tz::Tz,
        rest_day: Option<chrono::Weekday>,
    ) -> Result<BulkScheduleResponse, ScheduleError> {
        let window = request.window(timezone, rest_day)?;
        Ok(self.schedule(&request.emails, &window)?.to_response())
    }

    pub fn schedule(
        &mut self,
        emails: &[String],
        window: &SchedulingWindow,
    ) -> Result<BulkScheduleOutcome, ScheduleError> {
        if emails.is_empty() {
            return Err(ScheduleError::NoCandidates);
        }
        let mut packer = DaySlotPacker::new(window)?;

        let mut report = BulkOperationReport::new();
        let resolved = self.resolve(emails, &mut report);
        if resolved.is_empty() {
            info!(failed = report.failed.len(), "no candidate resolved; nothing scheduled");
            return Ok(BulkScheduleOutcome {
                report,
                batches: Vec::new(),
            });
        }

        let builder = StageScheduleBuilder::new(window.stage_duration_minutes, window.timezone);
        let mut plan = Vec::new();
        for (i, members) in partition(resolved, window.batch_size, &mut self.rng)?
            .into_iter()
            .enumerate()
        {
            let batch_number = i as u32 + 1;
            let slot = packer.next_slot();
            let schedule = builder.build(batch_number, slot.date, slot.start)?;
            debug!(batch_number, date = %slot.date, start = %slot.start, daily_index = slot.daily_index, "batch placed");
            plan.push(PlannedBatch {
                batch_number,
                members,
                schedule,
            });
        }

        // One reservation covers the whole call.
        let first_group = self.allocator.reserve(plan.len() as u32)?;

        let mut batches = Vec::with_capacity(plan.len());
        for batch in plan {
            let group_number = first_group + batch.batch_number - 1;
            let tag = batch_tag(batch.batch_number, group_number);
            let mut member_emails = Vec::with_capacity(batch.members.len());

            for mut candidate in batch.members {
                if self.deadline_passed() {
                    report.timed_out = true;
                    report.record_failure(candidate.email, REASON_DEADLINE);
                    continue;
                }
                batch.schedule.apply_to(&mut candidate, group_number, &tag);
                let email = candidate.email.clone();
                match self.store.save(candidate) {
                    Ok(_) => {
                        member_emails.push(email.clone());
                        report.record_success(email);
                    }
                    Err(e) => {
                        warn!(%email, error = %e, "save failed");
                        report.record_failure(email, e.to_string());
                    }
                }
            }

            let [stage1, stage2, stage3] = batch.schedule.clock_times();
            batches.push(BatchSummary {
                batch_number: batch.batch_number,
                group_number,
                members: member_emails,
                date: batch.schedule.date,
                stage1,
                stage2,
                stage3,
            });
        }

        info!(
            scheduled = report.succeeded.len(),
            failed = report.failed.len(),
            batches = batches.len(),
            first_group,
            timed_out = report.timed_out,
            "bulk schedule finished"
        );
        Ok(BulkScheduleOutcome { report, batches })
    }

    /// Look up each email once; misses go straight to the report.
    fn resolve(&self, emails: &[String], report: &mut BulkOperationReport) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for email in emails {
            let email = email.trim();
            if !seen.insert(email_key(email)) {
                continue;
            }
            match self.store.find_by_email(email) {
                Ok(Some(c)) => resolved.push(c),
                Ok(None) => {
                    warn!(%email, "candidate not found");
                    report.record_failure(email, REASON_NOT_FOUND);
                }
                Err(e) => {
                    warn!(%email, error = %e, "candidate lookup failed");
                    report.record_failure(email, e.to_string());
                }
            }
        }
        resolved
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::MonotonicAllocator;
    use crate::candidate::StageStatus;
    use crate::store::InMemoryStore;
    use crate::time::parse_clock;
    use chrono::NaiveDate;

    fn seeded_store(n: usize) -> InMemoryStore {
        InMemoryStore::from_candidates(
            (0..n).map(|i| Candidate::new(format!("c{i:02}"), format!("Cand {i}"), format!("c{i}@x.com"))),
        )
        .unwrap()
    }

    fn emails(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}@x.com")).collect()
    }

    fn window(batch_size: usize) -> SchedulingWindow {
        SchedulingWindow::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            parse_clock("09:00").unwrap(),
            parse_clock("17:00").unwrap(),
            60,
            batch_size,
        )
    }

    #[test]
    fn duplicate_emails_in_request_are_scheduled_once() {
        let store = seeded_store(2);
        let alloc = MonotonicAllocator::starting_at(1);
        let mut req = emails(2);
        req.push("c0@x.com".to_string());

        let out = BulkScheduler::new(&store, &alloc)
            .with_seed(1)
            .schedule(&req, &window(5))
            .unwrap();
        assert_eq!(out.report.succeeded.len(), 2);
        assert!(out.report.is_clean());
        assert_eq!(out.batches.len(), 1);
    }

    #[test]
    fn empty_request_is_rejected() {
        let store = seeded_store(0);
        let alloc = MonotonicAllocator::starting_at(1);
        let err = BulkScheduler::new(&store, &alloc)
            .schedule(&[], &window(5))
            .unwrap_err();
        assert_eq!(err, ScheduleError::NoCandidates);
    }

    #[test]
    fn nobody_resolved_returns_all_failed_report() {
        let store = seeded_store(0);
        let alloc = MonotonicAllocator::starting_at(1);
        let out = BulkScheduler::new(&store, &alloc)
            .schedule(&emails(2), &window(5))
            .unwrap();
        assert!(out.batches.is_empty());
        assert_eq!(out.report.failed.len(), 2);
        assert!(out.report.failed.iter().all(|f| f.reason == REASON_NOT_FOUND));
        // No reservation was made.
        assert_eq!(alloc.peek(), 1);
    }

    #[test]
    fn passed_deadline_keeps_partial_report() {
        let store = seeded_store(3);
        let alloc = MonotonicAllocator::starting_at(1);
        let out = BulkScheduler::new(&store, &alloc)
            .with_seed(3)
            .with_deadline(Instant::now())
            .schedule(&emails(3), &window(2))
            .unwrap();
        assert!(out.report.timed_out);
        assert!(out.report.succeeded.is_empty());
        assert_eq!(out.report.failed.len(), 3);
        assert!(out.report.failed.iter().all(|f| f.reason == REASON_DEADLINE));
        assert_eq!(out.batches.len(), 2);
        assert!(out.batches.iter().all(|b| b.members.is_empty()));
        for c in store.snapshot().unwrap() {
            assert_eq!(c.group_number, None);
            assert_eq!(c.screening.status, StageStatus::NotStarted);
        }
    }

    #[test]
    fn request_entry_point_produces_response_counts() {
        let store = seeded_store(7);
        let alloc = MonotonicAllocator::starting_at(10);
        let req = BulkScheduleRequest {
            emails: emails(7),
            batch_size: 3,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: "09:00".into(),
            end_time: "17:00".into(),
            stage_duration: 60,
        };
        let resp = BulkScheduler::new(&store, &alloc)
            .with_seed(9)
            .schedule_request(&req, chrono_tz::Tz::UTC, Some(chrono::Weekday::Sun))
            .unwrap();
        assert_eq!(resp.total_scheduled, 7);
        assert_eq!(resp.total_batches, 3);
        let groups: Vec<u32> = resp.batches.iter().map(|b| b.group_number).collect();
        assert_eq!(groups, vec![10, 11, 12]);
        assert_eq!(resp.batches[2].members.len(), 1);
    }
}
