//! Expands a batch's stage-1 start into the three stage instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::candidate::{Candidate, Stage, StageRecord};
use crate::error::ScheduleError;
use crate::time::{MINUTES_PER_DAY, format_clock, minutes_of, resolve_local};
use crate::window::STAGE_COUNT;

/// Audit tag written into each stage's remarks.
pub fn batch_tag(batch_number: u32, group_number: u32) -> String {
    format!("Batch {batch_number} - Group {group_number}")
}

/// Stage starts for one batch, all on the batch's calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSchedule {
    pub date: NaiveDate,
    pub local: [NaiveTime; 3],
    pub utc: [DateTime<Utc>; 3],
}

impl StageSchedule {
    pub fn clock_times(&self) -> [String; 3] {
        self.local.map(format_clock)
    }

    /// Overwrite all three stage records and the group number.
    pub fn apply_to(&self, candidate: &mut Candidate, group_number: u32, tag: &str) {
        candidate.group_number = Some(group_number);
        for stage in Stage::ALL {
            *candidate.stage_mut(stage) = StageRecord::scheduled(self.utc[stage.index()], tag);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StageScheduleBuilder {
    stage_minutes: u32,
    timezone: Tz,
}

impl StageScheduleBuilder {
    pub fn new(stage_minutes: u32, timezone: Tz) -> Self {
        Self {
            stage_minutes,
            timezone,
        }
    }

    /// Stage `i` starts `(i - 1) * D` after stage 1.
    ///
    /// A batch whose last stage would end after midnight is rejected rather
    /// than wrapped onto the next date.
    pub fn build(
        &self,
        batch_number: u32,
        date: NaiveDate,
        stage1: NaiveTime,
    ) -> Result<StageSchedule, ScheduleError> {
        let last_end = u64::from(minutes_of(stage1))
            + u64::from(STAGE_COUNT) * u64::from(self.stage_minutes);
        if last_end > u64::from(MINUTES_PER_DAY) {
            return Err(ScheduleError::CrossesMidnight {
                batch: batch_number,
                start: stage1,
            });
        }

        let first = NaiveDateTime::new(date, stage1);
        let step = TimeDelta::minutes(i64::from(self.stage_minutes));
        let local_dt = [first, first + step, first + step * 2];
        let utc = [
            resolve_local(local_dt[0], self.timezone)?,
            resolve_local(local_dt[1], self.timezone)?,
            resolve_local(local_dt[2], self.timezone)?,
        ];

        Ok(StageSchedule {
            date,
            local: local_dt.map(|dt| dt.time()),
            utc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::StageStatus;
    use crate::time::parse_clock;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn stages_are_one_duration_apart() {
        let b = StageScheduleBuilder::new(45, Tz::UTC);
        let s = b.build(1, date(), parse_clock("09:30").unwrap()).unwrap();
        assert_eq!(s.clock_times(), ["09:30", "10:15", "11:00"].map(String::from));
        assert_eq!(s.utc[2].to_rfc3339(), "2026-03-02T11:00:00+00:00");
    }

    #[test]
    fn local_zone_is_applied() {
        let b = StageScheduleBuilder::new(60, chrono_tz::Asia::Kolkata);
        let s = b.build(1, date(), parse_clock("09:00").unwrap()).unwrap();
        assert_eq!(s.utc[0].to_rfc3339(), "2026-03-02T03:30:00+00:00");
        assert_eq!(s.local[0], parse_clock("09:00").unwrap());
    }

    #[test]
    fn oversized_duration_is_rejected_without_wrapping() {
        let b = StageScheduleBuilder::new(1_431_655_766, Tz::UTC);
        let err = b.build(4, date(), parse_clock("09:00").unwrap()).unwrap_err();
        assert!(matches!(err, ScheduleError::CrossesMidnight { batch: 4, .. }));
    }

    #[test]
    fn ending_exactly_at_midnight_is_allowed() {
        let b = StageScheduleBuilder::new(60, Tz::UTC);
        assert!(b.build(1, date(), parse_clock("21:00").unwrap()).is_ok());
        let err = b.build(2, date(), parse_clock("21:30").unwrap()).unwrap_err();
        assert!(matches!(err, ScheduleError::CrossesMidnight { batch: 2, .. }));
    }

    #[test]
    fn apply_overwrites_every_stage() {
        let b = StageScheduleBuilder::new(30, Tz::UTC);
        let s = b.build(2, date(), parse_clock("10:00").unwrap()).unwrap();
        let mut c = Candidate::new("c1", "Asha", "asha@x.com");
        c.interview.remarks = "old note".to_string();

        s.apply_to(&mut c, 7, &batch_tag(2, 7));

        assert_eq!(c.group_number, Some(7));
        for stage in Stage::ALL {
            let r = c.stage(stage);
            assert_eq!(r.status, StageStatus::Scheduled);
            assert_eq!(r.remarks, "Batch 2 - Group 7");
            assert_eq!(r.scheduled_at, Some(s.utc[stage.index()]));
        }
    }
}
