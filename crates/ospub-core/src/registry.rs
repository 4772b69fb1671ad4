//! The registry client seam and its file-backed implementation.
//!
//! HTTP transport stays outside this crate; anything that can list, create,
//! update and delete records can sit behind `Registry`. `SnapshotRegistry`
//! backs a registry with a JSON array file and is what the CLI wires in.

use crate::record::Record;
use crate::types::{Kind, WriteScope};
use regex::Regex;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Restricts which entry ids a run touches.
#[derive(Debug, Clone)]
pub enum Selector {
    All,
    One(String),
    Pattern(Regex),
}

impl Selector {
    pub fn matches(&self, id: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::One(name) => id == name,
            Selector::Pattern(re) => re.is_match(id),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Selector::All => "all entries".to_string(),
            Selector::One(name) => format!("id '{name}'"),
            Selector::Pattern(re) => format!("pattern /{}/", re.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("conflict: {0} already exists")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::Conflict(_))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub trait Registry {
    /// Records matching `selector` whose kind is in `kinds`.
    fn list(&self, selector: &Selector, kinds: &[Kind]) -> Result<Vec<Record>, RegistryError>;

    fn read_one(&self, kind: Kind, id: &str) -> Result<Record, RegistryError>;

    fn create(&mut self, record: &Record, scope: WriteScope) -> Result<(), RegistryError>;

    fn update(&mut self, record: &Record, scope: WriteScope) -> Result<(), RegistryError>;

    fn delete(&mut self, record: &Record) -> Result<(), RegistryError>;
}

// ---------------------------------------------------------------------------
// SnapshotRegistry
// ---------------------------------------------------------------------------

/// A registry backed by a JSON array file. Reads load the whole snapshot;
/// writes mutate memory and land on disk via `persist`.
#[derive(Debug)]
pub struct SnapshotRegistry {
    path: Option<PathBuf>,
    records: Vec<Record>,
}

impl SnapshotRegistry {
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path)?;
        let records: Vec<Record> = serde_json::from_str(&text)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            records,
        })
    }

    pub fn in_memory(records: Vec<Record>) -> Self {
        Self {
            path: None,
            records,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Atomically rewrite the snapshot file. No-op for in-memory registries.
    pub fn persist(&self) -> Result<(), RegistryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.records)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path).map_err(|e| RegistryError::Io(e.error))?;
        Ok(())
    }

    fn position(&self, kind: Kind, id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.kind() == kind && r.id() == id)
    }
}

impl Registry for SnapshotRegistry {
    fn list(&self, selector: &Selector, kinds: &[Kind]) -> Result<Vec<Record>, RegistryError> {
        Ok(self
            .records
            .iter()
            .filter(|r| kinds.contains(&r.kind()) && selector.matches(r.id()))
            .cloned()
            .collect())
    }

    fn read_one(&self, kind: Kind, id: &str) -> Result<Record, RegistryError> {
        self.position(kind, id)
            .map(|i| self.records[i].clone())
            .ok_or_else(|| RegistryError::NotFound(format!("{kind} '{id}'")))
    }

    fn create(&mut self, record: &Record, _scope: WriteScope) -> Result<(), RegistryError> {
        if self.position(record.kind(), record.id()).is_some() {
            return Err(RegistryError::Conflict(record.display_name()));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn update(&mut self, record: &Record, _scope: WriteScope) -> Result<(), RegistryError> {
        match self.position(record.kind(), record.id()) {
            Some(i) => {
                self.records[i] = record.clone();
                Ok(())
            }
            None => Err(RegistryError::NotFound(record.display_name())),
        }
    }

    fn delete(&mut self, record: &Record) -> Result<(), RegistryError> {
        match self.position(record.kind(), record.id()) {
            Some(i) => {
                self.records.remove(i);
                Ok(())
            }
            None => Err(RegistryError::NotFound(record.display_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{segment, service};
    use tempfile::TempDir;

    #[test]
    fn selector_matching() {
        assert!(Selector::All.matches("anything"));
        assert!(Selector::One("svc-a".to_string()).matches("svc-a"));
        assert!(!Selector::One("svc-a".to_string()).matches("svc-b"));
        let re = Regex::new("^svc-").unwrap();
        assert!(Selector::Pattern(re).matches("svc-a"));
    }

    #[test]
    fn list_filters_by_kind_and_selector() {
        let reg = SnapshotRegistry::in_memory(vec![service("svc-a"), segment("seg-1", "S")]);
        let got = reg.list(&Selector::All, &[Kind::Service]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id(), "svc-a");
    }

    #[test]
    fn create_conflicts_on_existing() {
        let mut reg = SnapshotRegistry::in_memory(vec![service("svc-a")]);
        let err = reg
            .create(&service("svc-a"), WriteScope::RecordOnly)
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn update_missing_is_not_found() {
        let mut reg = SnapshotRegistry::in_memory(Vec::new());
        let err = reg
            .update(&service("svc-a"), WriteScope::RecordOnly)
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn delete_removes_record() {
        let mut reg = SnapshotRegistry::in_memory(vec![service("svc-a")]);
        reg.delete(&service("svc-a")).unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn persist_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "[]").unwrap();
        let mut reg = SnapshotRegistry::load(&path).unwrap();
        reg.create(&service("svc-a"), WriteScope::All).unwrap();
        reg.persist().unwrap();

        let back = SnapshotRegistry::load(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.records()[0].id(), "svc-a");
    }
}
