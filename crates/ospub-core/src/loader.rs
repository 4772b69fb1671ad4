//! Builds the deduplicated working set of entries from the source and
//! destination registries (or a serialized input file standing in for the
//! source).

use crate::entry::{sort_key, EntryRef};
use crate::error::{PublishError, Result};
use crate::record::Record;
use crate::registry::{Registry, Selector};
use crate::types::Kind;
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// LoadedSet
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LoadedSet {
    pub entries: Vec<EntryRef>,
    /// True when the source side came from the live registry rather than an
    /// input file. Drives the non-production-phase ignore rule.
    pub live_source: bool,
    /// Number of destination records in the working set, for gate ratios.
    pub dest_count: usize,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Kinds in scope for a run.
pub fn kinds_in_scope(skip_environments: bool) -> Vec<Kind> {
    Kind::all()
        .iter()
        .copied()
        .filter(|k| !(skip_environments && *k == Kind::Environment))
        .collect()
}

pub fn load(
    source: &dyn Registry,
    dest: &dyn Registry,
    selector: &Selector,
    input: Option<&Path>,
    skip_environments: bool,
) -> Result<LoadedSet> {
    let kinds = kinds_in_scope(skip_environments);

    let (source_records, live_source) = match input {
        Some(path) => (read_input_file(path, selector, &kinds)?, false),
        None => (source.list(selector, &kinds)?, true),
    };
    let dest_records = dest.list(selector, &kinds)?;
    let dest_count = dest_records.len();

    // Keyed by sort key so the pairs come out pre-grouped by kind.
    let mut pairs: BTreeMap<String, (Option<Record>, Option<Record>)> = BTreeMap::new();

    for record in source_records {
        let key = sort_key(record.kind(), record.id());
        let slot = pairs.entry(key).or_default();
        if slot.0.is_some() {
            return Err(duplicate("source", &record));
        }
        slot.0 = Some(record);
    }
    for record in dest_records {
        let key = sort_key(record.kind(), record.id());
        let slot = pairs.entry(key).or_default();
        if slot.1.is_some() {
            return Err(duplicate("destination", &record));
        }
        slot.1 = Some(record);
    }

    let mut entries = Vec::with_capacity(pairs.len());
    for (key, (source, dest)) in pairs {
        let record = source.as_ref().or(dest.as_ref());
        let Some(record) = record else {
            // Cannot happen: every slot was created with a record in hand.
            return Err(PublishError::EmptyEntry(key));
        };
        let entry = EntryRef::new(record.kind(), record.id().to_string(), source.clone(), dest)?;
        entries.push(entry);
    }

    Ok(LoadedSet {
        entries,
        live_source,
        dest_count,
    })
}

fn duplicate(side: &'static str, record: &Record) -> PublishError {
    PublishError::DuplicateEntry {
        side,
        kind: record.kind().to_string(),
        id: record.id().to_string(),
    }
}

/// Parse a serialized input file: a JSON array of records, tolerating the
/// `{}` sentinel the audit output stream starts with so a previous run's
/// output can be replayed as input.
fn read_input_file(path: &Path, selector: &Selector, kinds: &[Kind]) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).map_err(|e| PublishError::InputFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let values: Vec<serde_json::Value> =
        serde_json::from_str(&text).map_err(|e| PublishError::InputFile {
            path: path.display().to_string(),
            reason: format!("not a JSON array: {e}"),
        })?;

    let mut records = Vec::new();
    for value in values {
        if value.as_object().is_some_and(|o| o.is_empty()) {
            continue;
        }
        let record: Record =
            serde_json::from_value(value).map_err(|e| PublishError::InputFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if kinds.contains(&record.kind()) && selector.matches(record.id()) {
            records.push(record);
        }
    }
    Ok(records)
}
