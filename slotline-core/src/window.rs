//! Per-request scheduling window.

use chrono::{NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::time::minutes_of;

/// Number of pipeline stages every batch passes through.
pub const STAGE_COUNT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingWindow {
    pub start_date: NaiveDate,
    /// Earliest stage-1 start each day.
    pub start_time: NaiveTime,
    /// Every stage must finish by this time.
    pub end_time: NaiveTime,
    pub stage_duration_minutes: u32,
    pub batch_size: usize,
    /// Zone the wall-clock times above are expressed in.
    pub timezone: Tz,
    /// Day never scheduled on. `None` schedules every day.
    pub rest_day: Option<Weekday>,
}

impl SchedulingWindow {
    pub fn new(
        start_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        stage_duration_minutes: u32,
        batch_size: usize,
    ) -> Self {
        Self {
            start_date,
            start_time,
            end_time,
            stage_duration_minutes,
            batch_size,
            timezone: Tz::UTC,
            rest_day: Some(Weekday::Sun),
        }
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn with_rest_day(mut self, rest_day: Option<Weekday>) -> Self {
        self.rest_day = rest_day;
        self
    }

    /// Check the window and reduce it to minute arithmetic.
    pub fn geometry(&self) -> Result<WindowGeometry, ScheduleError> {
        if self.batch_size == 0 {
            return Err(ScheduleError::InvalidInput("batch size must be positive".to_string()));
        }
        if self.stage_duration_minutes == 0 {
            return Err(ScheduleError::InvalidInput(
                "stage duration must be positive".to_string(),
            ));
        }
        let start = minutes_of(self.start_time);
        let end = minutes_of(self.end_time);
        if end <= start {
            return Err(ScheduleError::InvalidInput(format!(
                "end time {} must be after start time {}",
                self.end_time, self.start_time
            )));
        }

        let geometry = WindowGeometry {
            start_minutes: start,
            end_minutes: end,
            stage_minutes: self.stage_duration_minutes,
        };
        let needed = STAGE_COUNT.checked_mul(geometry.stage_minutes);
        if needed.is_none_or(|needed| geometry.window_minutes() < needed) {
            return Err(ScheduleError::WindowTooShort {
                window_minutes: geometry.window_minutes(),
                stage_minutes: geometry.stage_minutes,
            });
        }
        Ok(geometry)
    }
}

/// A validated window in minutes since midnight.
///
/// Only built by `SchedulingWindow::geometry`, so `start < end` and three
/// stages always fit in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    start_minutes: u32,
    end_minutes: u32,
    stage_minutes: u32,
}

impl WindowGeometry {
    pub fn start_minutes(&self) -> u32 {
        self.start_minutes
    }

    pub fn end_minutes(&self) -> u32 {
        self.end_minutes
    }

    pub fn stage_minutes(&self) -> u32 {
        self.stage_minutes
    }

    pub fn window_minutes(&self) -> u32 {
        self.end_minutes - self.start_minutes
    }

    /// Upper bound on daily stage-1 starts, `floor((W - 2D) / D) + 1`.
    ///
    /// This counts starts whose first two stages end inside the window. The
    /// packer also requires the third stage to fit, so the last of these slots
    /// is only used when `fits` allows it; see `fitting_per_day`.
    pub fn max_per_day(&self) -> u32 {
        let d = self.stage_minutes;
        (self.window_minutes() - (STAGE_COUNT - 1) * d) / d + 1
    }

    /// Batches actually placed per day: `(n - 1) * D + 3 * D <= W`.
    pub fn fitting_per_day(&self) -> u32 {
        let d = self.stage_minutes;
        (self.window_minutes() - STAGE_COUNT * d) / d + 1
    }

    /// Stage-1 start of the batch at `daily_index`.
    pub fn start_offset(&self, daily_index: u32) -> u32 {
        self.start_minutes
            .saturating_add(daily_index.saturating_mul(self.stage_minutes))
    }

    /// Whether the batch at `daily_index` finishes all stages inside the window.
    pub fn fits(&self, daily_index: u32) -> bool {
        let end = u64::from(self.start_offset(daily_index))
            + u64::from(STAGE_COUNT) * u64::from(self.stage_minutes);
        end <= u64::from(self.end_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_clock;

    fn window(start: &str, end: &str, duration: u32) -> SchedulingWindow {
        SchedulingWindow::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            parse_clock(start).unwrap(),
            parse_clock(end).unwrap(),
            duration,
            5,
        )
    }

    #[test]
    fn eight_hour_window_of_hour_stages() {
        let g = window("09:00", "17:00", 60).geometry().unwrap();
        assert_eq!(g.window_minutes(), 480);
        assert_eq!(g.max_per_day(), 7);
        assert_eq!(g.fitting_per_day(), 6);
        // 14:00 start ends 17:00; 15:00 would end 18:00.
        assert!(g.fits(5));
        assert!(!g.fits(6));
    }

    #[test]
    fn exact_three_stage_window_fits_one() {
        let g = window("09:00", "12:00", 60).geometry().unwrap();
        assert_eq!(g.fitting_per_day(), 1);
        assert!(g.fits(0));
        assert!(!g.fits(1));
    }

    #[test]
    fn uneven_window_rounds_down() {
        let g = window("09:00", "12:50", 45).geometry().unwrap();
        // 230 minutes: third batch starts 10:30 and ends 12:45.
        assert_eq!(g.max_per_day(), 4);
        assert_eq!(g.fitting_per_day(), 3);
        assert!(g.fits(2));
        assert!(!g.fits(3));
    }

    #[test]
    fn short_window_is_rejected() {
        let err = window("09:00", "11:00", 60).geometry().unwrap_err();
        assert_eq!(
            err,
            ScheduleError::WindowTooShort {
                window_minutes: 120,
                stage_minutes: 60
            }
        );
    }

    #[test]
    fn huge_stage_duration_is_too_short_not_a_wrap() {
        // 3 * 1_431_655_766 wraps to 2 in u32 arithmetic.
        let err = window("09:00", "17:00", 1_431_655_766).geometry().unwrap_err();
        assert_eq!(
            err,
            ScheduleError::WindowTooShort {
                window_minutes: 480,
                stage_minutes: 1_431_655_766
            }
        );
        assert!(window("09:00", "17:00", u32::MAX).geometry().is_err());
    }

    #[test]
    fn fits_saturates_for_far_indices() {
        let g = window("09:00", "17:00", 60).geometry().unwrap();
        assert!(!g.fits(u32::MAX));
        assert_eq!(g.start_offset(u32::MAX), u32::MAX);
    }

    #[test]
    fn inverted_or_degenerate_windows_are_rejected() {
        assert!(matches!(
            window("17:00", "09:00", 60).geometry(),
            Err(ScheduleError::InvalidInput(_))
        ));
        assert!(matches!(
            window("09:00", "17:00", 0).geometry(),
            Err(ScheduleError::InvalidInput(_))
        ));
        let mut w = window("09:00", "17:00", 60);
        w.batch_size = 0;
        assert!(matches!(w.geometry(), Err(ScheduleError::InvalidInput(_))));
    }

    #[test]
    fn max_per_day_never_overflows_window() {
        for duration in [5u32, 15, 20, 30, 45, 60, 90] {
            for end_hour in 10..=23u32 {
                let end = format!("{end_hour:02}:00");
                if let Ok(g) = window("08:00", &end, duration).geometry() {
                    let n = g.fitting_per_day();
                    assert!(n >= 1);
                    assert!(g.max_per_day() >= n);
                    assert!(g.fits(n - 1));
                    assert!(!g.fits(n));
                }
            }
        }
    }
}
