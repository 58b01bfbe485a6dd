//! On-disk state under `~/.slotline` and the JSON-file candidate store.

use anyhow::{Context, Result};
use slotline_core::{Candidate, CandidateStore, InMemoryStore, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn slotline_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SLOTLINE_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".slotline"))
}

pub fn ensure_slotline_home() -> Result<PathBuf> {
    let dir = slotline_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn candidates_path() -> Result<PathBuf> {
    Ok(ensure_slotline_home()?.join("candidates.json"))
}

/// Candidates kept in memory and rewritten to one JSON file on every save.
///
/// Each save is durable on its own; there is no multi-record transaction. A
/// save whose file write fails is not kept in memory either, so a later save
/// never persists it by accident.
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let candidates: Vec<Candidate> = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
        } else {
            Vec::new()
        };
        let inner = InMemoryStore::from_candidates(candidates)
            .with_context(|| format!("load {}", path.display()))?;
        debug!(path = %path.display(), candidates = inner.len(), "candidate store opened");
        Ok(Self { path, inner })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(candidates_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, all: &[&Candidate]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(all)
            .map_err(|e| StoreError::Backend(format!("serialize candidates: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| StoreError::Backend(format!("write {}: {e}", self.path.display())))
    }
}

impl CandidateStore for JsonFileStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Candidate>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Candidate>, StoreError> {
        self.inner.find_by_email(email)
    }

    fn find_all(&self) -> Result<Vec<Candidate>, StoreError> {
        self.inner.find_all()
    }

    fn save(&self, candidate: Candidate) -> Result<Candidate, StoreError> {
        self.inner.save_with(candidate, |all| self.write_file(&all))
    }
}
