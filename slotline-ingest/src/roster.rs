//! Parse roster CSV exports and seed a candidate store from them.
//!
//! Rows with an invalid email, an email repeated within the file, or an
//! email the store already holds are skipped and reported, never fatal.

use anyhow::{Context, Result};
use regex::Regex;
use slotline_core::{CandidateStore, email_key};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::types::{ImportSummary, RosterRow, SkippedRow};

pub struct EmailValidator {
    re: Regex,
}

impl EmailValidator {
    pub fn new() -> Result<Self> {
        let re = Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")?;
        Ok(Self { re })
    }

    pub fn is_valid(&self, email: &str) -> bool {
        self.re.is_match(email.trim())
    }
}

pub fn parse_roster_csv(path: impl AsRef<Path>) -> Result<Vec<RosterRow>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_roster_reader(file).with_context(|| format!("parsing {}", path.as_ref().display()))
}

pub fn parse_roster_reader<R: Read>(reader: R) -> Result<Vec<RosterRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<RosterRow>().enumerate() {
        let row = result.with_context(|| format!("row {}", i + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Save new candidates for `rows`. Ids continue from `cand-NNNN` after the
/// store's current size.
pub fn import_roster<S: CandidateStore + ?Sized>(store: &S, rows: Vec<RosterRow>) -> Result<ImportSummary> {
    let validator = EmailValidator::new()?;
    let existing = store.find_all().context("reading existing candidates")?;
    let mut known: HashSet<String> = existing.iter().map(|c| email_key(&c.email)).collect();
    let mut next_id = existing.len() + 1;

    let mut summary = ImportSummary::default();
    for (i, row) in rows.into_iter().enumerate() {
        let email = row.email.trim().to_string();
        let skip_reason = if !validator.is_valid(&email) {
            Some("invalid email")
        } else if !known.insert(email_key(&email)) {
            Some("email already registered")
        } else {
            None
        };
        if let Some(reason) = skip_reason {
            warn!(row = i + 1, %email, reason, "roster row skipped");
            summary.skipped.push(SkippedRow {
                row: i + 1,
                email,
                reason: reason.to_string(),
            });
            continue;
        }

        // Ids may collide with hand-edited records; step forward.
        let mut id = format!("cand-{next_id:04}");
        while store.find_by_id(&id)?.is_some() {
            next_id += 1;
            id = format!("cand-{next_id:04}");
        }
        next_id += 1;

        let candidate = row.into_candidate(id);
        match store.save(candidate) {
            Ok(saved) => summary.imported.push(saved.email),
            Err(e) => summary.skipped.push(SkippedRow {
                row: i + 1,
                email,
                reason: e.to_string(),
            }),
        }
    }

    info!(
        imported = summary.imported.len(),
        skipped = summary.skipped.len(),
        "roster import finished"
    );
    Ok(summary)
}
