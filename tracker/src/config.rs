//! Tracker output configuration (TOML).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::report::ReporterOptions;

/// Output configuration, loadable from a TOML file.
///
/// Intended to be edited by humans and overridden by CLI flags. Missing
/// fields default to the minimal reporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Print steps (verbosity level 1).
    pub steps: bool,
    /// Debug output (verbosity level 2).
    pub debug: bool,
    /// Verbose output (verbosity level 3).
    pub verbose: bool,
    /// Disable cursor rewind before printing test results.
    pub noreverse: bool,
    /// Disable output truncation.
    pub notruncate: bool,
    /// Rendering mode: empty for the tree view, `"actor"` to suppress
    /// ancestor-chain printing.
    pub output_style: String,
    /// Base directory shortened to `.` in reported source locations.
    pub base_dir: String,
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        match self.output_style.as_str() {
            "" | "tree" | "actor" => Ok(()),
            other => Err(anyhow!(
                "output_style must be \"tree\" or \"actor\", got \"{other}\""
            )),
        }
    }

    pub fn reporter_options(&self) -> ReporterOptions {
        ReporterOptions {
            steps: self.steps,
            debug: self.debug,
            verbose: self.verbose,
            noreverse: self.noreverse,
            notruncate: self.notruncate,
            output_style: if self.output_style.is_empty() {
                None
            } else {
                Some(self.output_style.clone())
            },
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TrackerConfig::default()`.
pub fn load_config(path: &Path) -> Result<TrackerConfig> {
    if !path.exists() {
        let cfg = TrackerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TrackerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Write config to disk (pretty TOML, trailing newline).
pub fn write_config(path: &Path, cfg: &TrackerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}
