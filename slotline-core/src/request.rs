//! Caller-facing request shapes.

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::time::parse_clock;
use crate::window::SchedulingWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScheduleRequest {
    pub emails: Vec<String>,
    pub batch_size: usize,
    pub start_date: NaiveDate,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    /// Minutes per stage.
    pub stage_duration: u32,
}

impl BulkScheduleRequest {
    pub fn window(&self, timezone: Tz, rest_day: Option<Weekday>) -> Result<SchedulingWindow, ScheduleError> {
        Ok(SchedulingWindow::new(
            self.start_date,
            parse_clock(&self.start_time)?,
            parse_clock(&self.end_time)?,
            self.stage_duration,
            self.batch_size,
        )
        .with_timezone(timezone)
        .with_rest_day(rest_day))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReassignRequest {
    pub emails: Vec<String>,
    pub target_group_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_request_into_window() {
        let json = r#"{
            "emails": ["a@x.com"],
            "batchSize": 5,
            "startDate": "2026-03-02",
            "startTime": "09:00",
            "endTime": "17:00",
            "stageDuration": 60
        }"#;
        let req: BulkScheduleRequest = serde_json::from_str(json).unwrap();
        let w = req.window(Tz::UTC, Some(Weekday::Sun)).unwrap();
        assert_eq!(w.batch_size, 5);
        assert_eq!(w.geometry().unwrap().window_minutes(), 480);
    }

    #[test]
    fn bad_clock_string_is_invalid_input() {
        let req = BulkScheduleRequest {
            emails: vec![],
            batch_size: 5,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: "nine".into(),
            end_time: "17:00".into(),
            stage_duration: 60,
        };
        assert!(matches!(
            req.window(Tz::UTC, None),
            Err(ScheduleError::InvalidInput(_))
        ));
    }
}
