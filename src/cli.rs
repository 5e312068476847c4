//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{AnalyzerConfig, CycleStrategy};
use crate::error::Result;

/// Dependency and metrics analyzer for Java projects
#[derive(Parser, Debug)]
#[command(name = "depsight")]
#[command(about = "Dependency graph, coupling, cycle, dead-code and duplication analysis")]
#[command(version)]
#[command(author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory for JSON artifacts
    #[arg(short, long, global = true, env = "DEPSIGHT_OUTPUT", default_value = "depsight-report")]
    pub output: PathBuf,

    /// Configuration file (defaults to depsight.toml in the project root)
    #[arg(short, long, global = true, env = "DEPSIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Console output format
    #[arg(short, long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dependency graph, coupling, cycles and unused code
    Dependency(AnalyzeArgs),
    /// Per-class and project metrics, duplication and health
    Metrics(AnalyzeArgs),
    /// Graph metrics, topological order and typed edges
    Graph(AnalyzeArgs),
    /// Singletons, factories, accessors and test classes
    Patterns(AnalyzeArgs),
    /// Everything above plus a full report
    All(AnalyzeArgs),
    /// Entity counts without building the graph
    Summary(ProjectArgs),
    /// Delete cached results for a project
    ClearCache(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project root
    #[arg(value_name = "PROJECT", default_value = ".")]
    pub project: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Project root
    #[arg(value_name = "PROJECT", default_value = ".")]
    pub project: PathBuf,

    /// Near-duplicate similarity threshold (0.0 - 1.0)
    #[arg(long, env = "DEPSIGHT_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Minimum normalized body length for exact duplicates
    #[arg(long, env = "DEPSIGHT_MIN_BODY_LENGTH")]
    pub min_body_length: Option<usize>,

    /// Skip near-duplicate comparison
    #[arg(long)]
    pub no_similar: bool,

    /// Cycle detection strategy
    #[arg(long, env = "DEPSIGHT_CYCLES", value_enum)]
    pub cycles: Option<CycleMode>,

    /// Parser threads (0 = available parallelism)
    #[arg(long, env = "DEPSIGHT_THREADS")]
    pub threads: Option<usize>,

    /// Do not write JSON artifacts
    #[arg(long)]
    pub no_export: bool,

    /// Reuse and store full analyses in the user cache directory
    #[arg(long, env = "DEPSIGHT_CACHE")]
    pub cache: bool,

    /// Code pattern to search for (repeatable; default all)
    #[arg(long = "pattern", value_name = "NAME")]
    pub patterns: Vec<String>,
}

impl AnalyzeArgs {
    /// Apply flag overrides on top of file configuration
    pub fn apply(&self, config: &mut AnalyzerConfig) -> Result<()> {
        if let Some(threshold) = self.threshold {
            config.duplication.similarity_threshold = threshold;
        }
        if let Some(min_len) = self.min_body_length {
            config.duplication.min_body_length = min_len;
        }
        if self.no_similar {
            config.duplication.detect_similar = false;
        }
        if let Some(mode) = self.cycles {
            config.cycles.strategy = mode.into();
        }
        if let Some(threads) = self.threads {
            config.parallel.threads = threads;
        }
        if !self.patterns.is_empty() {
            config.patterns.enabled = self.patterns.clone();
        }
        config.validate()
    }
}

/// Cycle strategy as a CLI value
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CycleMode {
    /// Single DFS pass
    Dfs,
    /// Every elementary cycle, bounded
    Complete,
}

impl From<CycleMode> for CycleStrategy {
    fn from(mode: CycleMode) -> Self {
        match mode {
            CycleMode::Dfs => CycleStrategy::Dfs,
            CycleMode::Complete => CycleStrategy::Complete,
        }
    }
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text report
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}
