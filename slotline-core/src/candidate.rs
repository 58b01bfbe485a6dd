//! Candidate model: profile fields plus one record per pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three sequential pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Screening,
    GroupDiscussion,
    Interview,
}

impl Stage {
    /// Pipeline order.
    pub const ALL: [Stage; 3] = [Stage::Screening, Stage::GroupDiscussion, Stage::Interview];

    /// Zero-based position in the pipeline.
    pub fn index(self) -> usize {
        match self {
            Stage::Screening => 0,
            Stage::GroupDiscussion => 1,
            Stage::Interview => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Screening => "screening",
            Stage::GroupDiscussion => "group discussion",
            Stage::Interview => "interview",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    NotStarted,
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Selected,
    Rejected,
}

impl StageStatus {
    /// A decision has been recorded; the stage will not move again.
    pub fn is_terminal(self) -> bool {
        matches!(self, StageStatus::Completed | StageStatus::Selected | StageStatus::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageRecord {
    pub status: StageStatus,
    /// Stage start as a UTC instant.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Free text; scheduling writes a "Batch N - Group G" tag here.
    #[serde(default)]
    pub remarks: String,
}

impl StageRecord {
    pub fn scheduled(at: DateTime<Utc>, remarks: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Scheduled,
            scheduled_at: Some(at),
            remarks: remarks.into(),
        }
    }

    /// Status set and a date-time present.
    pub fn is_complete(&self) -> bool {
        self.status != StageStatus::NotStarted && self.scheduled_at.is_some()
    }
}

/// A person moving through the pipeline. Owned by the candidate store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub year: Option<u8>,
    #[serde(default)]
    pub lib_id: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,

    pub group_number: Option<u32>,

    #[serde(default)]
    pub screening: StageRecord,
    #[serde(default)]
    pub group_discussion: StageRecord,
    #[serde(default)]
    pub interview: StageRecord,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: None,
            year: None,
            lib_id: None,
            branch: None,
            domains: Vec::new(),
            group_number: None,
            screening: StageRecord::default(),
            group_discussion: StageRecord::default(),
            interview: StageRecord::default(),
        }
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group_number = Some(group);
        self
    }

    pub fn with_domains<I, D>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn stage(&self, stage: Stage) -> &StageRecord {
        match stage {
            Stage::Screening => &self.screening,
            Stage::GroupDiscussion => &self.group_discussion,
            Stage::Interview => &self.interview,
        }
    }

    pub fn stage_mut(&mut self, stage: Stage) -> &mut StageRecord {
        match stage {
            Stage::Screening => &mut self.screening,
            Stage::GroupDiscussion => &mut self.group_discussion,
            Stage::Interview => &mut self.interview,
        }
    }

    /// First stage lacking a date-time, in pipeline order.
    pub fn first_unscheduled_stage(&self) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|s| self.stage(*s).scheduled_at.is_none())
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d.eq_ignore_ascii_case(domain))
    }

    /// Emails compare trimmed and case-insensitively.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// Key under which two spellings of one email collide.
pub fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
