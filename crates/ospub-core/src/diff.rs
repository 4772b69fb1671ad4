//! Structural record comparison.
//!
//! The engine depends only on the `Comparator` seam and the `Diff` it
//! returns; `ValueComparator` is the default implementation, walking the
//! serialized JSON form of both records.

use crate::record::Record;
use serde_json::Value;
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added(Value),
    Removed(Value),
    Changed { from: Value, to: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    /// Dotted path into the record, e.g. `owner` or `classifications[2]`.
    pub path: String,
    pub change: Change,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    entries: Vec<DiffEntry>,
}

impl Diff {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Multi-line rendering with each line prefixed, for the audit log.
    pub fn render(&self, prefix: &str) -> String {
        let mut out = String::new();
        for e in &self.entries {
            match &e.change {
                Change::Added(v) => {
                    let _ = writeln!(out, "{prefix}+ {}: {v}", e.path);
                }
                Change::Removed(v) => {
                    let _ = writeln!(out, "{prefix}- {}: {v}", e.path);
                }
                Change::Changed { from, to } => {
                    let _ = writeln!(out, "{prefix}~ {}: {from} -> {to}", e.path);
                }
            }
        }
        out
    }

    pub fn summary(&self) -> String {
        format!("{} difference(s)", self.count())
    }
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

pub trait Comparator {
    /// Structural difference from `left` (destination) to `right` (source).
    fn compare(&self, left: &Record, right: &Record) -> Diff;
}

/// Deep compare over the serialized JSON of both records. Objects are
/// compared per key; arrays of keyed objects (`id` or `name` field) are
/// compared as unordered sets, all other arrays positionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueComparator;

impl Comparator for ValueComparator {
    fn compare(&self, left: &Record, right: &Record) -> Diff {
        let mut diff = Diff::empty();
        walk(&left.to_json_value(), &right.to_json_value(), "", &mut diff.entries);
        diff
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn element_key(v: &Value) -> Option<&str> {
    let obj = v.as_object()?;
    obj.get("id").or_else(|| obj.get("name"))?.as_str()
}

fn walk(left: &Value, right: &Value, path: &str, out: &mut Vec<DiffEntry>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            for (key, lv) in l {
                match r.get(key) {
                    Some(rv) => walk(lv, rv, &join(path, key), out),
                    None => out.push(DiffEntry {
                        path: join(path, key),
                        change: Change::Removed(lv.clone()),
                    }),
                }
            }
            for (key, rv) in r {
                if !l.contains_key(key) {
                    out.push(DiffEntry {
                        path: join(path, key),
                        change: Change::Added(rv.clone()),
                    });
                }
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            let keyed = !l.is_empty()
                && !r.is_empty()
                && l.iter().all(|v| element_key(v).is_some())
                && r.iter().all(|v| element_key(v).is_some());
            if keyed {
                walk_keyed(l, r, path, out);
            } else {
                walk_positional(l, r, path, out);
            }
        }
        (l, r) => {
            if l != r {
                out.push(DiffEntry {
                    path: path.to_string(),
                    change: Change::Changed {
                        from: l.clone(),
                        to: r.clone(),
                    },
                });
            }
        }
    }
}

fn walk_keyed(left: &[Value], right: &[Value], path: &str, out: &mut Vec<DiffEntry>) {
    for lv in left {
        let key = element_key(lv).unwrap_or_default();
        match right.iter().find(|rv| element_key(rv) == Some(key)) {
            Some(rv) => walk(lv, rv, &format!("{path}[{key}]"), out),
            None => out.push(DiffEntry {
                path: format!("{path}[{key}]"),
                change: Change::Removed(lv.clone()),
            }),
        }
    }
    for rv in right {
        let key = element_key(rv).unwrap_or_default();
        if !left.iter().any(|lv| element_key(lv) == Some(key)) {
            out.push(DiffEntry {
                path: format!("{path}[{key}]"),
                change: Change::Added(rv.clone()),
            });
        }
    }
}

fn walk_positional(left: &[Value], right: &[Value], path: &str, out: &mut Vec<DiffEntry>) {
    for (i, lv) in left.iter().enumerate() {
        match right.get(i) {
            Some(rv) => walk(lv, rv, &format!("{path}[{i}]"), out),
            None => out.push(DiffEntry {
                path: format!("{path}[{i}]"),
                change: Change::Removed(lv.clone()),
            }),
        }
    }
    for (i, rv) in right.iter().enumerate().skip(left.len()) {
        out.push(DiffEntry {
            path: format!("{path}[{i}]"),
            change: Change::Added(rv.clone()),
        });
    }
}
