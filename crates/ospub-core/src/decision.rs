//! Per-entry decision rules.
//!
//! `DecisionEngine::decide` is a pure function from one entry plus the run
//! flags to one planned action. Rules are priority-ordered; the first match
//! wins. See the rule numbers in the match arms.

use crate::diff::{Comparator, Diff};
use crate::entry::EntryRef;
use crate::error::{PublishError, Result};
use crate::record::Record;
use crate::tags::Marker;
use crate::types::{ActionKind, IgnoreReason, Phase};

// ---------------------------------------------------------------------------
// PlannedAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlannedAction {
    /// The record the action operates on: source for creates and updates,
    /// destination for deletes and incremental ignores.
    pub target: Record,
    /// The record being superseded, kept for diff reporting.
    pub prior: Option<Record>,
    pub action: ActionKind,
    pub diff: Diff,
    /// Set when the rules wanted to modify a record the registry declares
    /// non-writable.
    pub update_violation: bool,
}

impl PlannedAction {
    fn new(action: ActionKind, target: Record, prior: Option<Record>) -> Self {
        Self {
            target,
            prior,
            action,
            diff: Diff::empty(),
            update_violation: false,
        }
    }

    pub fn headline(&self) -> String {
        format!("{} {}", self.action, self.target.display_name())
    }
}

// ---------------------------------------------------------------------------
// DecisionEngine
// ---------------------------------------------------------------------------

pub struct DecisionEngine<'a> {
    comparator: &'a dyn Comparator,
    /// Destination is the staging registry; markers and normalization are
    /// relaxed there.
    pub staging_only: bool,
    pub forced: bool,
    pub incremental: bool,
    /// Source records came from the live registry, not an input file.
    pub live_source: bool,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(
        comparator: &'a dyn Comparator,
        staging_only: bool,
        forced: bool,
        incremental: bool,
        live_source: bool,
    ) -> Self {
        Self {
            comparator,
            staging_only,
            forced,
            incremental,
            live_source,
        }
    }

    pub fn decide(&self, entry: &EntryRef) -> Result<PlannedAction> {
        let mut planned = self.apply_rules(entry)?;
        self.normalize_native(&mut planned);
        Ok(planned)
    }

    fn apply_rules(&self, entry: &EntryRef) -> Result<PlannedAction> {
        let source = entry.source.as_ref();
        let dest = entry.dest.as_ref();

        // Rule 1: delete marker on the source removes the destination record.
        if let (Some(s), Some(d)) = (source, dest) {
            if s.tags().has(Marker::Delete) {
                return Ok(PlannedAction::new(
                    ActionKind::Delete,
                    d.clone(),
                    Some(d.clone()),
                ));
            }
        }

        if let Some(s) = source {
            // Rule 2: staging-only records never reach production.
            if s.tags().has(Marker::StagingOnly) && !self.staging_only {
                return Ok(PlannedAction::new(
                    ActionKind::Ignore(IgnoreReason::StagingMarker),
                    s.clone(),
                    None,
                ));
            }
            // Rule 3: live-source records still onboarding stay out.
            if self.live_source
                && s.onboarding_phase() != Phase::Unset
                && s.onboarding_phase() != Phase::Production
            {
                return Ok(PlannedAction::new(
                    ActionKind::Ignore(IgnoreReason::NonProductionPhase),
                    s.clone(),
                    None,
                ));
            }
            // Rule 4: test entries stay out of production.
            if s.tags().has(Marker::Test) && !self.staging_only {
                return Ok(PlannedAction::new(
                    ActionKind::Ignore(IgnoreReason::TestEntry),
                    s.clone(),
                    None,
                ));
            }
        }

        match (source, dest) {
            // Rule 5: both present — diff path.
            (Some(s), Some(d)) => Ok(self.decide_pair(s, d)),

            // Rule 6: only the source exists.
            (Some(s), None) => {
                if s.tags().has(Marker::Lock) && !self.staging_only {
                    Ok(PlannedAction::new(ActionKind::Locked, s.clone(), None))
                } else {
                    Ok(PlannedAction::new(ActionKind::Create, s.clone(), None))
                }
            }

            // Rule 7: only the destination exists.
            (None, Some(d)) => {
                if self.incremental {
                    Ok(PlannedAction::new(
                        ActionKind::Ignore(IgnoreReason::Incremental),
                        d.clone(),
                        None,
                    ))
                } else {
                    Ok(PlannedAction::new(
                        ActionKind::Delete,
                        d.clone(),
                        Some(d.clone()),
                    ))
                }
            }

            // Rule 8: neither side — the loader should have rejected this.
            (None, None) => Err(PublishError::EmptyEntry(entry.id.clone())),
        }
    }

    fn decide_pair(&self, source: &Record, dest: &Record) -> PlannedAction {
        let mut s = source.clone();
        let mut d = dest.clone();
        if !self.staging_only {
            s.prepare_for_compare(false);
            d.prepare_for_compare(false);
        }
        let diff = self.comparator.compare(&d, &s);

        let action = if source.tags().has(Marker::Lock) && !self.staging_only {
            ActionKind::Locked
        } else if self.forced {
            ActionKind::Update
        } else if diff.is_empty() {
            ActionKind::NotModified
        } else {
            ActionKind::Update
        };

        let mut planned = PlannedAction::new(action, s, Some(dest.clone()));
        planned.diff = diff;
        planned
    }

    /// Non-writable targets are managed by the registry itself. Downgrade
    /// the action to NATIVE and flag the attempt when it would have changed
    /// anything.
    fn normalize_native(&self, planned: &mut PlannedAction) {
        if planned.target.is_updatable() {
            return;
        }
        let violated = !matches!(
            planned.action,
            ActionKind::NotModified | ActionKind::Ignore(_)
        );
        planned.action = ActionKind::Native;
        if violated {
            planned.update_violation = true;
            tracing::warn!(
                target = %planned.target.display_name(),
                "attempted to modify a registry-managed record"
            );
        }
    }
}
