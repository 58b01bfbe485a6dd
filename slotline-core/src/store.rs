//! Candidate store seam.
//!
//! The engine only reads candidates and writes them back one at a time; there
//! is no cross-record transaction. `InMemoryStore` backs tests and the CLI.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::candidate::Candidate;
use crate::error::StoreError;

pub trait CandidateStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<Candidate>, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<Candidate>, StoreError>;

    fn find_all(&self) -> Result<Vec<Candidate>, StoreError>;

    /// Members of a group, ordered by id.
    fn find_by_group_number(&self, group: u32) -> Result<Vec<Candidate>, StoreError> {
        let mut members: Vec<Candidate> = self
            .find_all()?
            .into_iter()
            .filter(|c| c.group_number == Some(group))
            .collect();
        members.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(members)
    }

    /// Upsert by id. Returns the stored record.
    fn save(&self, candidate: Candidate) -> Result<Candidate, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, Candidate>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_candidates(candidates: impl IntoIterator<Item = Candidate>) -> Result<Self, StoreError> {
        let store = Self::new();
        for c in candidates {
            store.save(c)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records ordered by id.
    pub fn snapshot(&self) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.read()?.values().cloned().collect())
    }

    /// Upsert `candidate` only if `commit` accepts the resulting record set.
    ///
    /// `commit` runs under the write lock and sees every record ordered by id,
    /// the new one included. If it fails the map is put back as it was.
    pub fn save_with<F>(&self, candidate: Candidate, commit: F) -> Result<Candidate, StoreError>
    where
        F: FnOnce(Vec<&Candidate>) -> Result<(), StoreError>,
    {
        let mut records = self.write()?;
        check_unique_email(&records, &candidate)?;
        let previous = records.insert(candidate.id.clone(), candidate.clone());
        if let Err(e) = commit(records.values().collect()) {
            match previous {
                Some(prev) => records.insert(prev.id.clone(), prev),
                None => records.remove(&candidate.id),
            };
            return Err(e);
        }
        Ok(candidate)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Candidate>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("candidate map lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Candidate>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("candidate map lock poisoned".to_string()))
    }
}

impl CandidateStore for InMemoryStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Candidate>, StoreError> {
        Ok(self.read()?.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Candidate>, StoreError> {
        Ok(self.read()?.values().find(|c| c.has_email(email)).cloned())
    }

    fn find_all(&self) -> Result<Vec<Candidate>, StoreError> {
        self.snapshot()
    }

    fn save(&self, candidate: Candidate) -> Result<Candidate, StoreError> {
        let mut records = self.write()?;
        check_unique_email(&records, &candidate)?;
        records.insert(candidate.id.clone(), candidate.clone());
        Ok(candidate)
    }
}

// Email is unique across records.
fn check_unique_email(
    records: &BTreeMap<String, Candidate>,
    candidate: &Candidate,
) -> Result<(), StoreError> {
    if records
        .values()
        .any(|c| c.id != candidate.id && c.has_email(&candidate.email))
    {
        return Err(StoreError::DuplicateEmail(candidate.email.clone()));
    }
    Ok(())
}
