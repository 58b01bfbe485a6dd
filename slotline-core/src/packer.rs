//! Day slot packing.
//!
//! Batches are pipelined: while one batch is in stage 2 the next starts
//! stage 1, so consecutive starts are one stage-duration apart. A batch that
//! would finish after the window end moves to the next working day and the
//! daily counter restarts at zero.

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta, Weekday};
use tracing::debug;

use crate::error::ScheduleError;
use crate::window::{SchedulingWindow, WindowGeometry};

/// Placement of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    pub date: NaiveDate,
    /// Zero-based position among the day's batches.
    pub daily_index: u32,
    /// Stage-1 start.
    pub start: NaiveTime,
}

/// The day after `date`, skipping `rest_day`.
pub fn next_working_day(date: NaiveDate, rest_day: Option<Weekday>) -> NaiveDate {
    let mut next = date.succ_opt().unwrap_or(NaiveDate::MAX);
    while Some(next.weekday()) == rest_day && next != NaiveDate::MAX {
        next = next.succ_opt().unwrap_or(NaiveDate::MAX);
    }
    next
}

/// Infinite iterator of batch slots, in schedule order.
#[derive(Debug, Clone)]
pub struct DaySlotPacker {
    geometry: WindowGeometry,
    day_start: NaiveTime,
    rest_day: Option<Weekday>,
    date: NaiveDate,
    daily_index: u32,
}

impl DaySlotPacker {
    /// Validates the window; fails when not even one batch fits in a day.
    ///
    /// A start date on the rest day is moved to the next working day.
    pub fn new(window: &SchedulingWindow) -> Result<Self, ScheduleError> {
        let geometry = window.geometry()?;
        let mut date = window.start_date;
        if Some(date.weekday()) == window.rest_day {
            date = next_working_day(date, window.rest_day);
            debug!(requested = %window.start_date, moved_to = %date, "start date is a rest day");
        }
        Ok(Self {
            geometry,
            day_start: window.start_time,
            rest_day: window.rest_day,
            date,
            daily_index: 0,
        })
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn max_per_day(&self) -> u32 {
        self.geometry.max_per_day()
    }

    pub fn fitting_per_day(&self) -> u32 {
        self.geometry.fitting_per_day()
    }

    /// Place the next batch.
    pub fn next_slot(&mut self) -> SlotAssignment {
        if !self.geometry.fits(self.daily_index) {
            self.date = next_working_day(self.date, self.rest_day);
            self.daily_index = 0;
        }
        let k = self.daily_index;
        self.daily_index += 1;

        let offset = i64::from(k * self.geometry.stage_minutes());
        let (start, _) = self
            .day_start
            .overflowing_add_signed(TimeDelta::minutes(offset));
        SlotAssignment {
            date: self.date,
            daily_index: k,
            start,
        }
    }
}

impl Iterator for DaySlotPacker {
    type Item = SlotAssignment;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_slot())
    }
}
