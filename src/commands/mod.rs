//! Command handlers
//!
//! Each handler returns the console output; JSON artifacts are written to
//! the output directory as a side effect. A failed artifact write is reported
//! and skipped, never discarding the computed result.

mod analyze;
mod cache;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{Cli, Command, OutputFormat};
use crate::error::{EngineError, Result};

pub use analyze::{run_all, run_dependency, run_graph, run_metrics, run_patterns, run_summary};
pub use cache::run_clear_cache;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub output_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            output_dir: cli.output.clone(),
            config_path: cli.config.clone(),
            format: cli.format,
            verbose: cli.verbose,
        }
    }
}

/// Dispatch a parsed command line
pub fn run(cli: &Cli) -> Result<String> {
    let ctx = CommandContext::from_cli(cli);
    match &cli.command {
        Command::Dependency(args) => run_dependency(args, &ctx),
        Command::Metrics(args) => run_metrics(args, &ctx),
        Command::Graph(args) => run_graph(args, &ctx),
        Command::Patterns(args) => run_patterns(args, &ctx),
        Command::All(args) => run_all(args, &ctx),
        Command::Summary(args) => run_summary(args, &ctx),
        Command::ClearCache(args) => run_clear_cache(args, &ctx),
    }
}

/// Write one JSON artifact
pub fn export_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let target = dir.join(name);
    let write = || -> std::io::Result<()> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&target, json)
    };

    write().map_err(|source| EngineError::Export {
        target: target.clone(),
        source,
    })?;
    debug!("Wrote {}", target.display());
    Ok(target)
}

/// Outcome of writing a set of artifacts
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<EngineError>,
}

impl ExportReport {
    pub fn record(&mut self, result: Result<PathBuf>) {
        match result {
            Ok(path) => self.written.push(path),
            Err(e) => {
                warn!("{}", e);
                self.failed.push(e);
            }
        }
    }

    /// Console lines describing the export
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for path in &self.written {
            out.push_str(&format!("  wrote {}\n", path.display()));
        }
        for err in &self.failed {
            out.push_str(&format!("  export failed: {}\n", err));
        }
        out
    }
}
