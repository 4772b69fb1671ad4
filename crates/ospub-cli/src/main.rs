mod config;

use anyhow::Context;
use clap::Parser;
use config::RunConfig;
use ospub_core::audit::{NoopUploader, Notifier, Severity, Uploader};
use ospub_core::diff::ValueComparator;
use ospub_core::gate::AbortGate;
use ospub_core::pipeline::{self, PublishOptions, RunContext};
use ospub_core::prompt::StdinPrompter;
use ospub_core::registry::{Selector, SnapshotRegistry};
use ospub_core::types::Mode;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "ospub",
    about = "OSS catalog publisher — reconcile staging records into production",
    version
)]
struct Cli {
    /// Read-only: plan and report, write nothing (default)
    #[arg(long, group = "mode")]
    ro: bool,

    /// Read-write: apply the plan to the destination registry
    #[arg(long, group = "mode")]
    rw: bool,

    /// Plan, prompt for confirmation, then apply
    #[arg(long, group = "mode")]
    interactive: bool,

    /// Rewrite records even when unmodified; retry conflicting creates as updates
    #[arg(long)]
    force: bool,

    /// Restrict the run to a single entry id
    #[arg(long, group = "selector")]
    service: Option<String>,

    /// Restrict by regex over entry ids ('all' matches everything)
    #[arg(long, group = "selector")]
    pattern: Option<String>,

    /// Use a serialized record file as the source instead of the live registry
    #[arg(long)]
    input: Option<PathBuf>,

    /// Publish to the staging registry (requires --input)
    #[arg(long, group = "dest")]
    staging: bool,

    /// Publish to the production registry (default)
    #[arg(long, group = "dest")]
    production: bool,

    /// Never delete records that are missing from the source
    #[arg(long)]
    incremental: bool,

    /// Skip environment records entirely
    #[arg(long = "no-environments")]
    no_environments: bool,

    /// JSON output file
    #[arg(long, default_value = "ospub-out.json")]
    output: PathBuf,

    /// Log file
    #[arg(long, default_value = "ospub.log")]
    log: PathBuf,

    /// Run configuration (registry snapshot paths, gate thresholds)
    #[arg(long, default_value = "ospub.yaml", env = "OSPUB_CONFIG")]
    config: PathBuf,
}

/// Copies artifacts into a directory; the stand-in for object storage.
struct DirUploader {
    dir: PathBuf,
}

impl Uploader for DirUploader {
    fn upload(&self, path: &Path, _content_type: &str) -> Result<(), String> {
        let name = path
            .file_name()
            .ok_or_else(|| format!("no file name in {}", path.display()))?;
        std::fs::create_dir_all(&self.dir).map_err(|e| e.to_string())?;
        std::fs::copy(path, self.dir.join(name)).map_err(|e| e.to_string())?;
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    if let Err(msg) = validate(&cli) {
        eprintln!("error: {msg}");
        std::process::exit(2);
    }

    match execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn validate(cli: &Cli) -> Result<(), String> {
    if cli.staging && cli.input.is_none() {
        return Err("--staging requires --input".to_string());
    }
    if cli.incremental && !cli.staging && !cli.production {
        return Err("--incremental requires an explicit --staging or --production".to_string());
    }
    Ok(())
}

fn selector(cli: &Cli) -> anyhow::Result<Selector> {
    if let Some(id) = &cli.service {
        return Ok(Selector::One(id.clone()));
    }
    if let Some(pattern) = &cli.pattern {
        let pattern = if pattern == "all" { ".*" } else { pattern };
        let re = regex_from(pattern)?;
        return Ok(Selector::Pattern(re));
    }
    Ok(Selector::All)
}

fn regex_from(pattern: &str) -> anyhow::Result<regex::Regex> {
    regex::Regex::new(pattern).with_context(|| format!("invalid pattern '{pattern}'"))
}

fn execute(cli: Cli) -> anyhow::Result<i32> {
    let config = RunConfig::load(&cli.config)?;

    let mode = if cli.interactive {
        Mode::Interactive
    } else if cli.rw {
        Mode::ReadWrite
    } else {
        Mode::ReadOnly
    };

    let source = match (&cli.input, &config.source) {
        (Some(_), _) => SnapshotRegistry::in_memory(Vec::new()),
        (None, Some(path)) => SnapshotRegistry::load(path)
            .with_context(|| format!("source registry {}", path.display()))?,
        (None, None) => {
            anyhow::bail!("no source: set 'source' in {} or pass --input", cli.config.display())
        }
    };

    let dest_path = if cli.staging {
        config
            .staging
            .clone()
            .with_context(|| format!("'staging' not set in {}", cli.config.display()))?
    } else {
        config
            .production
            .clone()
            .with_context(|| format!("'production' not set in {}", cli.config.display()))?
    };
    let mut dest = SnapshotRegistry::load(&dest_path)
        .with_context(|| format!("destination registry {}", dest_path.display()))?;

    let opts = PublishOptions {
        mode,
        force: cli.force,
        incremental: cli.incremental,
        staging_destination: cli.staging,
        selector: selector(&cli)?,
        input: cli.input.clone(),
        skip_environments: cli.no_environments,
        output_path: cli.output.clone(),
        log_path: cli.log.clone(),
    };

    let comparator = ValueComparator;
    let mut prompter = StdinPrompter;
    let uploader: Box<dyn Uploader> = match &config.upload_dir {
        Some(dir) => Box::new(DirUploader { dir: dir.clone() }),
        None => Box::new(NoopUploader),
    };
    let notifier = StderrNotifier;

    let report = pipeline::run(RunContext {
        opts,
        source: &source,
        dest: &mut dest,
        comparator: &comparator,
        prompter: &mut prompter,
        uploader: uploader.as_ref(),
        notifier: &notifier,
        gate: AbortGate::new(config.gate),
    })?;

    if report.final_mode.writes_enabled() && !report.stopped {
        dest.persist().context("failed to persist destination snapshot")?;
    }

    print!("{}", report.stats.planned.report("planned actions"));
    print!("{}", report.stats.actual.report("actions applied"));
    if let Some(msg) = &report.abort_message {
        println!("abort gate: {msg}");
    }

    if report.stopped {
        println!("stopped by operator; nothing applied");
        return Ok(3);
    }
    Ok(0)
}

/// Prints operator notifications to stderr; the stand-in for the chat
/// transport.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn post(
        &self,
        title: &str,
        body: &str,
        severity: Severity,
        _mention: Option<&str>,
    ) -> Result<(), String> {
        if severity != Severity::Info {
            eprintln!("[{severity}] {title}\n{body}");
        }
        Ok(())
    }
}
