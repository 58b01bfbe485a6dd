//! Moving existing candidates into an already-scheduled group.
//!
//! The target group must be fully scheduled; its stage instants and remarks
//! are copied verbatim onto every moved candidate.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{info, warn};

use crate::candidate::{Stage, StageRecord, email_key};
use crate::error::ScheduleError;
use crate::report::{BulkOperationReport, GroupReassignResponse, SchedulingTimes};
use crate::request::GroupReassignRequest;
use crate::store::CandidateStore;
use crate::{REASON_DEADLINE, REASON_NOT_FOUND};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignOutcome {
    pub report: BulkOperationReport,
    pub target_group_number: u32,
    pub times: SchedulingTimes,
}

impl ReassignOutcome {
    pub fn to_response(&self) -> GroupReassignResponse {
        GroupReassignResponse {
            updated: self.report.succeeded.clone(),
            failed: self.report.failed.clone(),
            target_group_number: self.target_group_number,
            scheduling_times: self.times,
        }
    }
}

/// Schedule copied from the target group's representative member.
struct TargetSchedule {
    times: SchedulingTimes,
    remarks: [String; 3],
}

pub struct GroupReassigner<'a, S: CandidateStore + ?Sized> {
    store: &'a S,
    deadline: Option<Instant>,
}

impl<'a, S: CandidateStore + ?Sized> GroupReassigner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn reassign_request(
        &self,
        request: &GroupReassignRequest,
    ) -> Result<GroupReassignResponse, ScheduleError> {
        Ok(self
            .reassign(&request.emails, request.target_group_number)?
            .to_response())
    }

    pub fn reassign(&self, emails: &[String], target: u32) -> Result<ReassignOutcome, ScheduleError> {
        let source = self.target_schedule(target)?;
        let instants = source.times.as_array();

        let mut report = BulkOperationReport::new();
        let mut seen = HashSet::new();
        for email in emails {
            let email = email.trim();
            if !seen.insert(email_key(email)) {
                continue;
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                report.timed_out = true;
                report.record_failure(email, REASON_DEADLINE);
                continue;
            }

            let mut candidate = match self.store.find_by_email(email) {
                Ok(Some(c)) => c,
                Ok(None) => {
                    warn!(%email, "candidate not found");
                    report.record_failure(email, REASON_NOT_FOUND);
                    continue;
                }
                Err(e) => {
                    report.record_failure(email, e.to_string());
                    continue;
                }
            };

            candidate.group_number = Some(target);
            for stage in Stage::ALL {
                let i = stage.index();
                *candidate.stage_mut(stage) =
                    StageRecord::scheduled(instants[i], source.remarks[i].clone());
            }

            match self.store.save(candidate) {
                Ok(_) => report.record_success(email),
                Err(e) => {
                    warn!(%email, error = %e, "save failed");
                    report.record_failure(email, e.to_string());
                }
            }
        }

        info!(
            target,
            updated = report.succeeded.len(),
            failed = report.failed.len(),
            "group reassignment finished"
        );
        Ok(ReassignOutcome {
            report,
            target_group_number: target,
            times: source.times,
        })
    }

    /// Read the target's schedule from its lowest-id member.
    fn target_schedule(&self, target: u32) -> Result<TargetSchedule, ScheduleError> {
        let members = self.store.find_by_group_number(target)?;
        let representative = members
            .first()
            .ok_or(ScheduleError::TargetNotFound(target))?;

        let times = SchedulingTimes::from_candidate(representative).ok_or_else(|| {
            ScheduleError::IncompleteTargetSchedule {
                group: target,
                stage: representative
                    .first_unscheduled_stage()
                    .unwrap_or(Stage::Screening),
            }
        })?;

        let remarks = Stage::ALL.map(|stage| {
            let r = &representative.stage(stage).remarks;
            if r.trim().is_empty() {
                format!("Group {target}")
            } else {
                r.clone()
            }
        });

        Ok(TargetSchedule { times, remarks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, StageStatus};
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn scheduled_member(id: &str, email: &str, group: u32) -> Candidate {
        let mut c = Candidate::new(id, id, email).with_group(group);
        for (i, stage) in Stage::ALL.into_iter().enumerate() {
            let at = Utc.with_ymd_and_hms(2026, 3, 2, 9 + i as u32, 0, 0).unwrap();
            *c.stage_mut(stage) = StageRecord::scheduled(at, "Batch 1 - Group 3");
        }
        c
    }

    #[test]
    fn missing_target_group_fails_whole_call() {
        let store = InMemoryStore::from_candidates([Candidate::new("c1", "A", "a@x.com")]).unwrap();
        let err = GroupReassigner::new(&store)
            .reassign(&["a@x.com".to_string()], 3)
            .unwrap_err();
        assert_eq!(err, ScheduleError::TargetNotFound(3));
    }

    #[test]
    fn blank_remarks_fall_back_to_group_tag() {
        let mut src = scheduled_member("g1", "g1@x.com", 4);
        src.interview.remarks.clear();
        let store = InMemoryStore::from_candidates([src, Candidate::new("c1", "A", "a@x.com")]).unwrap();

        GroupReassigner::new(&store)
            .reassign(&["a@x.com".to_string()], 4)
            .unwrap();

        let moved = store.find_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(moved.screening.remarks, "Batch 1 - Group 3");
        assert_eq!(moved.interview.remarks, "Group 4");
        assert_eq!(moved.interview.status, StageStatus::Scheduled);
    }

    #[test]
    fn request_entry_point_echoes_target_times() {
        let store = InMemoryStore::from_candidates([
            scheduled_member("g1", "g1@x.com", 3),
            Candidate::new("c1", "A", "a@x.com"),
        ])
        .unwrap();
        let resp = GroupReassigner::new(&store)
            .reassign_request(&GroupReassignRequest {
                emails: vec!["a@x.com".into()],
                target_group_number: 3,
            })
            .unwrap();
        assert_eq!(resp.updated, vec!["a@x.com".to_string()]);
        assert_eq!(resp.target_group_number, 3);
        assert_eq!(
            resp.scheduling_times.stage2,
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn repeated_emails_are_moved_once() {
        let store = InMemoryStore::from_candidates([
            scheduled_member("g1", "g1@x.com", 3),
            Candidate::new("c1", "A", "a@x.com"),
        ])
        .unwrap();
        let emails = ["a@x.com", " a@x.com", "A@X.com"].map(String::from);

        let outcome = GroupReassigner::new(&store).reassign(&emails, 3).unwrap();

        assert_eq!(outcome.report.succeeded, vec!["a@x.com".to_string()]);
        assert!(outcome.report.failed.is_empty());
        assert_eq!(store.find_by_group_number(3).unwrap().len(), 2);
    }
}
