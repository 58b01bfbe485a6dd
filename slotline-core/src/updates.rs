//! Single-candidate stage updates (status, date-time, remarks, domains).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::candidate::{Candidate, Stage, StageStatus};
use crate::error::UpdateError;
use crate::store::CandidateStore;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageUpdate {
    pub status: StageStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    /// Domains to add to the candidate.
    pub domains: Option<Vec<String>>,
}

impl StageUpdate {
    fn validate_domains(&self) -> Result<Vec<String>, UpdateError> {
        let Some(domains) = &self.domains else {
            return Ok(Vec::new());
        };
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(domains.len());
        for d in domains {
            let d = d.trim();
            if d.is_empty() {
                return Err(UpdateError::InvalidInput("domain names cannot be empty".to_string()));
            }
            if !seen.insert(d.to_lowercase()) {
                return Err(UpdateError::InvalidInput(format!(
                    "domain '{d}' listed more than once"
                )));
            }
            out.push(d.to_string());
        }
        Ok(out)
    }
}

/// Apply `update` to one stage of candidate `id` and persist it.
///
/// Adding a domain the candidate already has rejects the whole update and
/// leaves the stored record untouched.
pub fn update_stage<S: CandidateStore + ?Sized>(
    store: &S,
    id: &str,
    stage: Stage,
    update: StageUpdate,
) -> Result<Candidate, UpdateError> {
    let new_domains = update.validate_domains()?;
    let mut candidate = store
        .find_by_id(id)?
        .ok_or_else(|| UpdateError::NotFound(id.to_string()))?;

    if let Some(dup) = new_domains.iter().find(|d| candidate.has_domain(d)) {
        return Err(UpdateError::Duplicate {
            id: id.to_string(),
            domain: dup.clone(),
        });
    }
    candidate.domains.extend(new_domains);

    let record = candidate.stage_mut(stage);
    record.status = update.status;
    if update.scheduled_at.is_some() {
        record.scheduled_at = update.scheduled_at;
    }
    if let Some(remarks) = update.remarks {
        record.remarks = remarks;
    }

    debug!(id, %stage, status = ?update.status, "stage updated");
    Ok(store.save(candidate)?)
}
