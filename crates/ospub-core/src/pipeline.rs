//! The fixed run sequence: load, order, decide, gate, confirm, execute,
//! report. Planning always completes before the first write; that two-phase
//! shape is what makes interactive confirmation meaningful.

use crate::audit::{AuditSink, Notifier, Severity, Uploader};
use crate::decision::{DecisionEngine, PlannedAction};
use crate::diff::Comparator;
use crate::entry::sort_entries;
use crate::error::Result;
use crate::executor::Executor;
use crate::gate::AbortGate;
use crate::loader;
use crate::prompt::{PromptReply, Prompter};
use crate::registry::{Registry, Selector};
use crate::stats::StatsLedger;
use crate::types::{Mode, WriteScope};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// PublishOptions
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PublishOptions {
    pub mode: Mode,
    pub force: bool,
    pub incremental: bool,
    /// Destination is the staging registry rather than production.
    pub staging_destination: bool,
    pub selector: Selector,
    /// Serialized source records; replaces the live source registry.
    pub input: Option<PathBuf>,
    pub skip_environments: bool,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
}

impl PublishOptions {
    pub fn destination_name(&self) -> &'static str {
        if self.staging_destination {
            "staging"
        } else {
            "production"
        }
    }

    pub fn write_scope(&self) -> WriteScope {
        if self.staging_destination {
            WriteScope::All
        } else {
            WriteScope::RecordOnly
        }
    }
}

// ---------------------------------------------------------------------------
// RunContext
// ---------------------------------------------------------------------------

/// Everything one run owns or borrows. Replaces what would otherwise be
/// module-level state; the pipeline threads it through explicitly.
pub struct RunContext<'a> {
    pub opts: PublishOptions,
    pub source: &'a dyn Registry,
    pub dest: &'a mut dyn Registry,
    pub comparator: &'a dyn Comparator,
    pub prompter: &'a mut dyn Prompter,
    pub uploader: &'a dyn Uploader,
    pub notifier: &'a dyn Notifier,
    pub gate: AbortGate,
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RunReport {
    /// Mode the run actually executed under, after gate downgrades and
    /// interactive replies.
    pub final_mode: Mode,
    pub abort_message: Option<String>,
    pub stats: StatsLedger,
    /// Operator answered `stop`; nothing was applied.
    pub stopped: bool,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub fn run(mut ctx: RunContext) -> Result<RunReport> {
    let mut sink = AuditSink::open(&ctx.opts.log_path, &ctx.opts.output_path)?;
    sink.header(
        ctx.opts.mode,
        ctx.opts.destination_name(),
        &ctx.opts.selector,
    );

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| run_phases(&mut ctx, &mut sink)));
    match outcome {
        Ok(Ok(report)) => {
            let severity = if report.abort_message.is_some() || report.stats.actual.errors > 0 {
                Severity::Warning
            } else {
                Severity::Info
            };
            let mut body = report.stats.actual.report("actions applied");
            if let Some(msg) = &report.abort_message {
                body.push_str(&format!("abort gate: {msg}\n"));
            }
            sink.finalize(
                ctx.uploader,
                ctx.notifier,
                &format!("ospub finished ({})", report.final_mode),
                &body,
                severity,
            );
            Ok(report)
        }
        Ok(Err(e)) => {
            sink.line(&format!("fatal: {e}"));
            sink.finalize(
                ctx.uploader,
                ctx.notifier,
                "ospub failed",
                &e.to_string(),
                Severity::Critical,
            );
            Err(e)
        }
        Err(panic) => {
            let msg = panic_message(&panic);
            sink.line(&format!("panic: {msg}"));
            sink.finalize(
                ctx.uploader,
                ctx.notifier,
                "ospub panicked",
                &msg,
                Severity::Critical,
            );
            std::panic::resume_unwind(panic)
        }
    }
}

fn run_phases(ctx: &mut RunContext, sink: &mut AuditSink) -> Result<RunReport> {
    // Phase 1: load and order.
    let set = loader::load(
        ctx.source,
        &*ctx.dest,
        &ctx.opts.selector,
        ctx.opts.input.as_deref(),
        ctx.opts.skip_environments,
    )?;
    let mut entries = set.entries;
    sort_entries(&mut entries);
    sink.line(&format!(
        "loaded {} entries ({} in destination)",
        entries.len(),
        set.dest_count
    ));

    // Phase 2: decide everything before touching anything.
    let engine = DecisionEngine::new(
        ctx.comparator,
        ctx.opts.staging_destination,
        ctx.opts.force,
        ctx.opts.incremental,
        set.live_source,
    );
    let mut stats = StatsLedger::default();
    let mut actions: Vec<PlannedAction> = Vec::with_capacity(entries.len());
    for entry in &entries {
        let planned = engine.decide(entry)?;
        stats.planned.record(&planned);
        actions.push(planned);
    }

    // Phase 3: abort gate over the planned ledger.
    let abort_message = ctx.gate.evaluate(&stats.planned, set.dest_count);
    let mut mode = ctx.opts.mode;
    let mut stopped = false;

    if let Some(msg) = &abort_message {
        sink.line(&format!("abort gate: {msg}"));
        tracing::error!(%msg, "abort gate tripped");
        if mode == Mode::ReadWrite {
            sink.line("downgrading to read-only; no writes will be attempted");
            mode = Mode::ReadOnly;
        }
    }

    // Phase 4: interactive confirmation.
    if mode == Mode::Interactive {
        let mut report = stats.planned.report("planned actions");
        if let Some(msg) = &abort_message {
            report.push_str(&format!("abort gate: {msg}\n"));
        }
        sink.upload_partial(ctx.uploader);
        if let Err(e) = ctx.notifier.post(
            "ospub awaiting confirmation",
            &format!("{report}\nlog: {}", sink.log_path().display()),
            Severity::Warning,
            None,
        ) {
            tracing::error!(error = %e, "confirmation notification failed");
        }
        match ctx.prompter.ask(&report)? {
            PromptReply::Continue => {
                sink.line("operator: continue (read-write)");
                mode = Mode::ReadWrite;
            }
            PromptReply::ReadOnly => {
                sink.line("operator: readonly");
                mode = Mode::ReadOnly;
            }
            PromptReply::Stop => {
                sink.line("operator: stop");
                mode = Mode::ReadOnly;
                stopped = true;
            }
        }
    }

    // Phase 5: execute in plan order.
    if !stopped {
        let executor = Executor::new(mode, ctx.opts.force, ctx.opts.write_scope());
        executor.execute(&mut actions, ctx.dest, sink, &mut stats.actual);
    }

    let mut footer = stats.planned.report("planned actions");
    footer.push('\n');
    footer.push_str(&stats.actual.report("actions applied"));
    sink.footer(&footer);

    Ok(RunReport {
        final_mode: mode,
        abort_message,
        stats,
        stopped,
    })
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
