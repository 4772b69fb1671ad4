//! YAML run configuration: where the registry snapshots live and any gate
//! threshold overrides.

use anyhow::Context;
use ospub_core::gate::GatePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Live source registry snapshot. Required unless `--input` is given.
    pub source: Option<PathBuf>,
    /// Staging destination registry snapshot.
    pub staging: Option<PathBuf>,
    /// Production destination registry snapshot.
    pub production: Option<PathBuf>,
    /// Abort-gate threshold overrides.
    #[serde(default)]
    pub gate: GatePolicy,
    /// Directory the log and JSON artifacts are shipped to on teardown.
    pub upload_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Load from `path`, or fall back to an empty config when the file does
    /// not exist (every run still needs the registry paths it uses).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: RunConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}
