//! Action statistics: one bucket set for the plan, one for what actually
//! happened, plus the text report both phases append to the audit log.

use crate::decision::PlannedAction;
use crate::types::{ActionKind, IgnoreReason};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

// ---------------------------------------------------------------------------
// ActionStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub not_modified: usize,
    pub locked: usize,
    pub native: usize,
    pub errors: usize,
    /// Per-reason ignore counts, keyed by the reason's display string.
    pub ignored: BTreeMap<&'static str, usize>,
    pub update_violations: usize,
}

impl ActionStats {
    pub fn record(&mut self, planned: &PlannedAction) {
        self.record_action(planned.action);
        if planned.update_violation {
            self.update_violations += 1;
        }
    }

    pub fn record_action(&mut self, action: ActionKind) {
        match action {
            ActionKind::Create => self.created += 1,
            ActionKind::Update => self.updated += 1,
            ActionKind::Delete => self.deleted += 1,
            ActionKind::NotModified => self.not_modified += 1,
            ActionKind::Locked => self.locked += 1,
            ActionKind::Native => self.native += 1,
            ActionKind::Ignore(reason) => {
                *self.ignored.entry(reason.as_str()).or_default() += 1;
            }
            ActionKind::Error => self.errors += 1,
        }
    }

    pub fn ignored_total(&self) -> usize {
        self.ignored.values().sum()
    }

    pub fn total(&self) -> usize {
        self.created
            + self.updated
            + self.deleted
            + self.not_modified
            + self.locked
            + self.native
            + self.errors
            + self.ignored_total()
    }

    pub fn report(&self, label: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{label} ({} entries):", self.total());
        let _ = writeln!(out, "  create        {:>6}", self.created);
        let _ = writeln!(out, "  update        {:>6}", self.updated);
        let _ = writeln!(out, "  delete        {:>6}", self.deleted);
        let _ = writeln!(out, "  not modified  {:>6}", self.not_modified);
        let _ = writeln!(out, "  locked        {:>6}", self.locked);
        let _ = writeln!(out, "  native        {:>6}", self.native);
        let _ = writeln!(out, "  ignored       {:>6}", self.ignored_total());
        for reason in IgnoreReason::all() {
            if let Some(n) = self.ignored.get(reason.as_str()) {
                let _ = writeln!(out, "    {:<24} {:>4}", reason.as_str(), n);
            }
        }
        let _ = writeln!(out, "  errors        {:>6}", self.errors);
        if self.update_violations > 0 {
            let _ = writeln!(out, "  update violations {:>2}", self.update_violations);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// StatsLedger
// ---------------------------------------------------------------------------

/// The planned bucket is filled while deciding, the actual bucket while
/// executing. Each phase owns exactly one of them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsLedger {
    pub planned: ActionStats,
    pub actual: ActionStats,
}
