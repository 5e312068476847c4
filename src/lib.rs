//! depsight: dependency and metrics analysis for Java projects
//!
//! Source files are parsed with tree-sitter into a language-neutral entity
//! model. From that model the engine derives a typed dependency graph,
//! afferent/efferent coupling and instability, circular dependencies, unused
//! classes and methods, exact and near-duplicate methods, and a metrics
//! roll-up with maintainability index, technical debt and a health grade,
//! plus a search for structural code patterns such as singletons and factories.
//!
//! # Example
//!
//! ```ignore
//! use depsight_engine::{Analyzer, AnalyzerConfig};
//! use std::path::Path;
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default());
//! let analysis = analyzer.analyze_all(Path::new("path/to/project"))?;
//!
//! println!("health {:.1} ({})", analysis.metrics.health.score, analysis.metrics.health.grade.as_str());
//! for cycle in &analysis.dependencies.cycles.cycles {
//!     println!("cycle: {}", cycle.join(" -> "));
//! }
//! ```

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod coupling;
pub mod cycles;
pub mod detectors;
pub mod duplication;
pub mod error;
pub mod extract;
pub mod graph;
pub mod indexing;
pub mod lang;
pub mod metrics;
pub mod patterns;
pub mod resolve;
pub mod schema;
pub mod unused;
pub mod utils;

// Re-export commonly used types
pub use analysis::{
    format_analysis_report, format_summary, Analyzer, DependencyResult, GraphResult, MetricsResult,
    ProjectAnalysis, ProjectSummary,
};
pub use cache::{CacheDir, ResultCache};
pub use cli::{Cli, OutputFormat};
pub use config::{AnalyzerConfig, CycleStrategy};
pub use coupling::{calculate_coupling, CouplingMetrics, CouplingReport, StabilityBand};
pub use cycles::{detect_cycles, CycleReport};
pub use duplication::{detect_duplicates, DuplicationGroup, DuplicationKind, MethodBody};
pub use error::{EngineError, Result};
pub use extract::{parse_and_extract, FileExtraction};
pub use graph::{DependencyEdge, DependencyGraph, EdgeKind, GraphDiagnostics};
pub use indexing::{EntityProvider, JavaProvider, ProviderOutput};
pub use lang::Lang;
pub use metrics::{ClassMetrics, HealthAssessment, HealthGrade, ProjectMetrics};
pub use patterns::{find_patterns, CodePattern, PatternMatch, PatternSearchResult};
pub use resolve::{ProjectResolver, SymbolResolver};
pub use schema::{Entity, EntityKind, EntityModel, Member, MemberKind, Reference, ReferenceKind, Visibility};
pub use unused::{DefaultEntryPoints, EntryPointPolicy};
