//! Applies the plan, one action at a time, in orderer order.
//!
//! Failures are contained per action: the action is demoted to `ERROR`,
//! counted, logged, and the loop moves on. The only implicit retry is
//! create-conflict-to-update under forced mode.

use crate::audit::AuditSink;
use crate::decision::PlannedAction;
use crate::registry::Registry;
use crate::stats::ActionStats;
use crate::types::{ActionKind, Mode, WriteScope};

pub struct Executor {
    pub mode: Mode,
    pub forced: bool,
    pub scope: WriteScope,
}

impl Executor {
    pub fn new(mode: Mode, forced: bool, scope: WriteScope) -> Self {
        Self {
            mode,
            forced,
            scope,
        }
    }

    /// Run every action sequentially, mutating each to its final outcome,
    /// recording it in the actual ledger and streaming audit output.
    pub fn execute(
        &self,
        actions: &mut [PlannedAction],
        dest: &mut dyn Registry,
        sink: &mut AuditSink,
        actual: &mut ActionStats,
    ) {
        for planned in actions.iter_mut() {
            self.apply(planned, dest, sink);
            actual.record(planned);
            sink.action(planned);
            // Deleted, ignored, failed and unchanged records carry no body;
            // everything else lands in the output stream.
            if !matches!(
                planned.action,
                ActionKind::Error
                    | ActionKind::Delete
                    | ActionKind::Ignore(_)
                    | ActionKind::NotModified
            ) {
                sink.append_record(&planned.target);
            }
        }
    }

    fn apply(&self, planned: &mut PlannedAction, dest: &mut dyn Registry, sink: &mut AuditSink) {
        if !planned.action.is_write() || !self.mode.writes_enabled() {
            return;
        }
        match planned.action {
            ActionKind::Create => match dest.create(&planned.target, self.scope) {
                Ok(()) => {}
                Err(e) if e.is_conflict() && self.forced => {
                    match dest.update(&planned.target, self.scope) {
                        Ok(()) => {
                            planned.action = ActionKind::Update;
                            tracing::warn!(
                                target = %planned.target.display_name(),
                                "create conflicted; forced retry as update succeeded"
                            );
                            sink.line(&format!(
                                "warning: create of {} conflicted; retried as update",
                                planned.target.display_name()
                            ));
                        }
                        Err(retry) => self.fail(planned, sink, &retry.to_string()),
                    }
                }
                Err(e) => self.fail(planned, sink, &e.to_string()),
            },
            ActionKind::Update => {
                if let Err(e) = dest.update(&planned.target, self.scope) {
                    self.fail(planned, sink, &e.to_string());
                }
            }
            ActionKind::Delete => {
                if let Err(e) = dest.delete(&planned.target) {
                    self.fail(planned, sink, &e.to_string());
                }
            }
            _ => {}
        }
    }

    fn fail(&self, planned: &mut PlannedAction, sink: &mut AuditSink, reason: &str) {
        sink.line(&format!(
            "error: {} {} failed: {reason}",
            planned.action,
            planned.target.display_name()
        ));
        tracing::error!(
            target = %planned.target.display_name(),
            action = %planned.action,
            %reason,
            "registry write failed"
        );
        planned.action = ActionKind::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditSink;
    use crate::diff::Diff;
    use crate::record::fixtures::service;
    use crate::record::Record;
    use crate::registry::SnapshotRegistry;
    use crate::types::Kind;
    use tempfile::TempDir;

    fn sink(dir: &TempDir) -> AuditSink {
        AuditSink::open(&dir.path().join("run.log"), &dir.path().join("out.json")).unwrap()
    }

    fn planned(action: ActionKind, target: Record) -> PlannedAction {
        PlannedAction {
            target,
            prior: None,
            action,
            diff: Diff::empty(),
            update_violation: false,
        }
    }

    fn rw() -> Executor {
        Executor::new(Mode::ReadWrite, false, WriteScope::RecordOnly)
    }

    #[test]
    fn create_lands_in_registry() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut dest = SnapshotRegistry::in_memory(Vec::new());
        let mut actions = vec![planned(ActionKind::Create, service("svc-a"))];
        let mut actual = ActionStats::default();

        rw().execute(&mut actions, &mut dest, &mut s, &mut actual);

        assert_eq!(dest.len(), 1);
        assert_eq!(actual.created, 1);
        assert_eq!(actions[0].action, ActionKind::Create);
    }

    #[test]
    fn read_only_mode_never_writes() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut dest = SnapshotRegistry::in_memory(Vec::new());
        let mut actions = vec![planned(ActionKind::Create, service("svc-a"))];
        let mut actual = ActionStats::default();

        let exec = Executor::new(Mode::ReadOnly, false, WriteScope::RecordOnly);
        exec.execute(&mut actions, &mut dest, &mut s, &mut actual);

        assert!(dest.is_empty());
        // The actual ledger still records what the plan called for.
        assert_eq!(actual.created, 1);
    }

    #[test]
    fn delete_removes_from_registry() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut dest = SnapshotRegistry::in_memory(vec![service("svc-c")]);
        let mut actions = vec![planned(ActionKind::Delete, service("svc-c"))];
        let mut actual = ActionStats::default();

        rw().execute(&mut actions, &mut dest, &mut s, &mut actual);

        assert!(dest.is_empty());
        assert_eq!(actual.deleted, 1);
    }

    #[test]
    fn failed_update_becomes_error_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        // svc-a missing from dest, so the update fails; svc-b still runs.
        let mut dest = SnapshotRegistry::in_memory(Vec::new());
        let mut actions = vec![
            planned(ActionKind::Update, service("svc-a")),
            planned(ActionKind::Create, service("svc-b")),
        ];
        let mut actual = ActionStats::default();

        rw().execute(&mut actions, &mut dest, &mut s, &mut actual);

        assert_eq!(actions[0].action, ActionKind::Error);
        assert_eq!(actions[1].action, ActionKind::Create);
        assert_eq!(actual.errors, 1);
        assert_eq!(actual.created, 1);
        assert_eq!(dest.len(), 1);
    }

    #[test]
    fn create_conflict_without_force_is_error() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut dest = SnapshotRegistry::in_memory(vec![service("svc-f")]);
        let mut actions = vec![planned(ActionKind::Create, service("svc-f"))];
        let mut actual = ActionStats::default();

        rw().execute(&mut actions, &mut dest, &mut s, &mut actual);

        assert_eq!(actions[0].action, ActionKind::Error);
        assert_eq!(actual.errors, 1);
    }

    #[test]
    fn create_conflict_with_force_retries_as_update() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut existing = service("svc-f");
        if let Record::Service(svc) = &mut existing {
            svc.owner = Some("old-team".to_string());
        }
        let mut dest = SnapshotRegistry::in_memory(vec![existing]);
        let mut actions = vec![planned(ActionKind::Create, service("svc-f"))];
        let mut actual = ActionStats::default();

        let exec = Executor::new(Mode::ReadWrite, true, WriteScope::RecordOnly);
        exec.execute(&mut actions, &mut dest, &mut s, &mut actual);

        assert_eq!(actions[0].action, ActionKind::Update);
        assert_eq!(actual.updated, 1);
        assert_eq!(actual.errors, 0);
        let got = dest
            .read_one(Kind::Service, "svc-f")
            .unwrap();
        if let Record::Service(svc) = got {
            assert_eq!(svc.owner.as_deref(), Some("team-oss"));
        }
        drop(s);
        let log = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(log.contains("retried as update"));
    }

    #[test]
    fn non_write_actions_touch_nothing() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut dest = SnapshotRegistry::in_memory(vec![service("svc-a")]);
        let mut actions = vec![
            planned(ActionKind::NotModified, service("svc-a")),
            planned(ActionKind::Locked, service("svc-a")),
            planned(ActionKind::Native, service("svc-a")),
        ];
        let mut actual = ActionStats::default();

        rw().execute(&mut actions, &mut dest, &mut s, &mut actual);

        assert_eq!(dest.len(), 1);
        assert_eq!(actual.not_modified, 1);
        assert_eq!(actual.locked, 1);
        assert_eq!(actual.native, 1);
    }

    #[test]
    fn json_bodies_skip_deletes_ignores_and_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut dest = SnapshotRegistry::in_memory(vec![service("svc-b"), service("svc-c")]);
        let mut actions = vec![
            planned(ActionKind::Create, service("svc-a")),
            planned(ActionKind::NotModified, service("svc-b")),
            planned(ActionKind::Delete, service("svc-c")),
            planned(
                ActionKind::Ignore(crate::types::IgnoreReason::TestEntry),
                service("svc-d"),
            ),
        ];
        let mut actual = ActionStats::default();

        rw().execute(&mut actions, &mut dest, &mut s, &mut actual);
        use crate::audit::{NoopNotifier, NoopUploader, Severity};
        s.finalize(&NoopUploader, &NoopNotifier, "t", "b", Severity::Info);
        drop(s);

        let text = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        // sentinel + svc-a only
        assert_eq!(values.len(), 2);
        assert_eq!(values[1]["name"], "svc-a");
    }

    #[test]
    fn json_bodies_written_for_locked_and_native() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        let mut dest = SnapshotRegistry::in_memory(vec![service("svc-l"), service("svc-n")]);
        let mut actions = vec![
            planned(ActionKind::Locked, service("svc-l")),
            planned(ActionKind::Native, service("svc-n")),
        ];
        let mut actual = ActionStats::default();

        rw().execute(&mut actions, &mut dest, &mut s, &mut actual);
        use crate::audit::{NoopNotifier, NoopUploader, Severity};
        s.finalize(&NoopUploader, &NoopNotifier, "t", "b", Severity::Info);
        drop(s);

        let text = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[1]["name"], "svc-l");
        assert_eq!(values[2]["name"], "svc-n");
        // Neither record was written to the destination.
        assert_eq!(dest.len(), 2);
    }
}
