//! The abort gate: a deterministic check over the planned ledger that can
//! stop a batch before anything is written.

use crate::stats::ActionStats;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GatePolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Abort when the batch would delete more than this fraction of the
    /// destination records in scope.
    #[serde(default = "default_max_delete_fraction")]
    pub max_delete_fraction: f64,
    /// Abort when the batch would update more than this fraction.
    #[serde(default = "default_max_update_fraction")]
    pub max_update_fraction: f64,
    /// Fraction heuristics only apply at or above this destination size;
    /// tiny batches trip ratios too easily.
    #[serde(default = "default_min_destination_records")]
    pub min_destination_records: usize,
}

fn default_max_delete_fraction() -> f64 {
    0.25
}

fn default_max_update_fraction() -> f64 {
    0.75
}

fn default_min_destination_records() -> usize {
    10
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_delete_fraction: default_max_delete_fraction(),
            max_update_fraction: default_max_update_fraction(),
            min_destination_records: default_min_destination_records(),
        }
    }
}

// ---------------------------------------------------------------------------
// AbortGate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AbortGate {
    policy: GatePolicy,
}

impl AbortGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self { policy }
    }

    /// Returns an abort message when the planned ledger looks unsafe,
    /// `None` when the batch may proceed. Deterministic given the ledger.
    pub fn evaluate(&self, planned: &ActionStats, dest_count: usize) -> Option<String> {
        if planned.errors > 0 {
            return Some(format!(
                "{} planned action(s) are errors; refusing to write",
                planned.errors
            ));
        }
        if planned.update_violations > 0 {
            return Some(format!(
                "{} update violation(s) on registry-managed records",
                planned.update_violations
            ));
        }
        if dest_count >= self.policy.min_destination_records {
            let deletes = planned.deleted as f64 / dest_count as f64;
            if deletes > self.policy.max_delete_fraction {
                return Some(format!(
                    "batch would delete {}/{} destination records ({:.0}% > {:.0}% limit)",
                    planned.deleted,
                    dest_count,
                    deletes * 100.0,
                    self.policy.max_delete_fraction * 100.0
                ));
            }
            let updates = planned.updated as f64 / dest_count as f64;
            if updates > self.policy.max_update_fraction {
                return Some(format!(
                    "batch would update {}/{} destination records ({:.0}% > {:.0}% limit)",
                    planned.updated,
                    dest_count,
                    updates * 100.0,
                    self.policy.max_update_fraction * 100.0
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionKind;

    fn stats(created: usize, updated: usize, deleted: usize) -> ActionStats {
        let mut s = ActionStats::default();
        for _ in 0..created {
            s.record_action(ActionKind::Create);
        }
        for _ in 0..updated {
            s.record_action(ActionKind::Update);
        }
        for _ in 0..deleted {
            s.record_action(ActionKind::Delete);
        }
        s
    }

    #[test]
    fn quiet_batch_passes() {
        let gate = AbortGate::default();
        assert!(gate.evaluate(&stats(3, 2, 1), 100).is_none());
    }

    #[test]
    fn planned_error_aborts() {
        let gate = AbortGate::default();
        let mut s = stats(0, 0, 0);
        s.record_action(ActionKind::Error);
        assert!(gate.evaluate(&s, 100).is_some());
    }

    #[test]
    fn update_violation_aborts() {
        let gate = AbortGate::default();
        let mut s = stats(0, 0, 0);
        s.update_violations = 1;
        assert!(gate.evaluate(&s, 100).is_some());
    }

    #[test]
    fn mass_delete_aborts() {
        let gate = AbortGate::default();
        let msg = gate.evaluate(&stats(0, 0, 30), 100).unwrap();
        assert!(msg.contains("delete"));
    }

    #[test]
    fn mass_update_aborts() {
        let gate = AbortGate::default();
        let msg = gate.evaluate(&stats(0, 80, 0), 100).unwrap();
        assert!(msg.contains("update"));
    }

    #[test]
    fn small_destinations_skip_fraction_checks() {
        // One delete out of two records is 50%, but the destination is too
        // small for ratios to mean anything.
        let gate = AbortGate::default();
        assert!(gate.evaluate(&stats(0, 0, 1), 2).is_none());
    }

    #[test]
    fn deterministic_given_ledger() {
        let gate = AbortGate::default();
        let s = stats(0, 0, 30);
        assert_eq!(gate.evaluate(&s, 100), gate.evaluate(&s, 100));
    }
}
