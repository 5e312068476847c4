//! Analysis orchestration
//!
//! The [`Analyzer`] runs the batch pipeline: entity model, then the dependency
//! graph, then coupling, cycles and unused code, then the metrics roll-up.
//! Duplicate detection runs off the model's method bodies and is merged into
//! the metrics result, and the code-pattern search runs off the model alone.
//! Every command reloads the model; only the full analysis is memoized.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheDir, ResultCache};
use crate::config::AnalyzerConfig;
use crate::coupling::{calculate_coupling, CouplingReport};
use crate::cycles::{detect_cycles, topological_order, CycleReport};
use crate::duplication::{detect_duplicates, DuplicationGroup, MethodBody};
use crate::error::{EngineError, Result};
use crate::graph::{DependencyEdge, DependencyGraph, GraphDiagnostics};
use crate::indexing::{collect_files, EntityProvider, JavaProvider, ProviderOutput};
use crate::metrics::{
    assess_health, class_metrics, graph_metrics, method_usage, most_used_classes, project_metrics,
    ClassMetrics, GraphMetrics, HealthAssessment, MethodUsage, ProjectInputs, ProjectMetrics,
};
use crate::patterns::{builtin_patterns, find_patterns, patterns_by_name, CodePattern, PatternSearchResult};
use crate::schema::{EntityModel, SkippedFile, SCHEMA_VERSION};
use crate::unused::{find_unused_classes, find_unused_methods, DefaultEntryPoints, EntryPointPolicy};
use crate::utils::{abbreviate_qualified_name, truncate_with_ellipsis};

/// Graph, coupling, cycles and unused code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyResult {
    pub graph: DependencyGraph,
    pub coupling: CouplingReport,
    pub cycles: CycleReport,
    pub unused_classes: Vec<String>,
    /// `Owner.method` ids
    pub unused_methods: Vec<String>,
}

/// Per-entity and project metrics, duplication and health
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsResult {
    pub classes: Vec<ClassMetrics>,
    pub project: ProjectMetrics,
    pub duplicates: Vec<DuplicationGroup>,
    pub method_usage: Vec<MethodUsage>,
    pub most_used_classes: Vec<(String, usize)>,
    pub health: HealthAssessment,
}

/// Graph-shape view of the dependencies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphResult {
    pub metrics: GraphMetrics,
    /// Dependencies before dependents
    pub topological_order: Vec<String>,
    pub edges: Vec<DependencyEdge>,
    pub package_dependencies: BTreeMap<String, BTreeSet<String>>,
}

/// Wall-clock time per phase, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTiming {
    pub parse_ms: u64,
    pub analysis_ms: u64,
    pub total_ms: u64,
}

/// Everything one full run produces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub schema_version: String,
    pub project_root: String,
    pub generated_at: String,
    pub files_parsed: usize,
    pub dependencies: DependencyResult,
    pub metrics: MetricsResult,
    pub graph: GraphResult,
    #[serde(default)]
    pub patterns: PatternSearchResult,
    pub diagnostics: GraphDiagnostics,
    pub timing: AnalysisTiming,
}

/// Counts that need no graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_root: String,
    pub total_entities: usize,
    pub entities_by_kind: BTreeMap<String, usize>,
    pub total_methods: usize,
    pub total_fields: usize,
    pub total_lines_of_code: usize,
    /// Package -> entity count
    pub packages: BTreeMap<String, usize>,
    pub files_parsed: usize,
    pub files_skipped: usize,
}

impl ProjectSummary {
    pub fn from_model(model: &EntityModel) -> Self {
        let mut summary = Self {
            total_entities: model.len(),
            ..Default::default()
        };

        for entity in model.iter() {
            *summary
                .entities_by_kind
                .entry(entity.kind.as_str().to_string())
                .or_insert(0) += 1;
            *summary.packages.entry(entity.package.clone()).or_insert(0) += 1;
            summary.total_methods += entity.methods().count();
            summary.total_fields += entity.fields().count();
            summary.total_lines_of_code += entity.callables().map(|m| m.line_count).sum::<usize>();
        }
        summary
    }
}

/// Pipeline entry point
pub struct Analyzer {
    config: AnalyzerConfig,
    provider: Box<dyn EntityProvider>,
    entry_points: Box<dyn EntryPointPolicy>,
    patterns: Vec<Box<dyn CodePattern>>,
    memo: ResultCache,
    disk_cache: bool,
}

impl Analyzer {
    /// Analyzer with the Java front-end and default entry-point rules
    pub fn new(config: AnalyzerConfig) -> Self {
        let provider = Box::new(JavaProvider::new(config.parallel.clone()));
        let entry_points = Box::new(DefaultEntryPoints::new(config.entry_points.clone()));
        let patterns = patterns_by_name(&config.patterns.enabled).unwrap_or_else(|e| {
            warn!("{}; searching all built-in patterns", e);
            builtin_patterns()
        });
        Self {
            config,
            provider,
            entry_points,
            patterns,
            memo: ResultCache::new(),
            disk_cache: false,
        }
    }

    pub fn with_provider(mut self, provider: Box<dyn EntityProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_entry_points(mut self, entry_points: Box<dyn EntryPointPolicy>) -> Self {
        self.entry_points = entry_points;
        self
    }

    /// Replace the patterns searched for
    pub fn with_patterns(mut self, patterns: Vec<Box<dyn CodePattern>>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Persist full analyses under the XDG cache dir and reuse fresh ones
    pub fn with_disk_cache(mut self, enabled: bool) -> Self {
        self.disk_cache = enabled;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn canonical_root(root: &Path) -> Result<PathBuf> {
        if !root.is_dir() {
            return Err(EngineError::InvalidProjectRoot {
                path: root.display().to_string(),
            });
        }
        Ok(root.canonicalize()?)
    }

    fn load(&self, root: &Path) -> Result<ProviderOutput> {
        let root = Self::canonical_root(root)?;
        self.provider.provide(&root)
    }

    fn load_nonempty(&self, root: &Path) -> Result<ProviderOutput> {
        let output = self.load(root)?;
        if output.model.is_empty() {
            return Err(EngineError::EmptyProject {
                path: root.display().to_string(),
            });
        }
        Ok(output)
    }

    fn dependency_phase(&self, model: &EntityModel, skipped: Vec<SkippedFile>) -> DependencyResult {
        let graph = DependencyGraph::build(model).with_skipped_files(skipped);
        let coupling = calculate_coupling(&graph.class_dependencies, &self.config.coupling);
        let cycles = detect_cycles(&graph.class_dependencies, &self.config.cycles);
        let unused_classes =
            find_unused_classes(model, &graph.class_dependencies, self.entry_points.as_ref());
        let unused_methods = find_unused_methods(model, &graph.call_counts, self.entry_points.as_ref());

        DependencyResult {
            graph,
            coupling,
            cycles,
            unused_classes,
            unused_methods,
        }
    }

    fn metrics_phase(&self, model: &EntityModel, deps: &DependencyResult) -> MetricsResult {
        let bodies = MethodBody::collect(model);
        let duplicates = detect_duplicates(&bodies, &self.config.duplication);
        let classes = class_metrics(model, &deps.graph, &deps.coupling, &self.config.metrics);

        let project = project_metrics(
            &ProjectInputs {
                model,
                classes: &classes,
                duplicates: &duplicates,
                call_counts: &deps.graph.call_counts,
                unused_methods: deps.unused_methods.len(),
                unused_classes: deps.unused_classes.len(),
            },
            &self.config.metrics,
        );
        let health = assess_health(deps.cycles.cycles.len(), duplicates.len(), &project);

        MetricsResult {
            method_usage: method_usage(&deps.graph),
            most_used_classes: most_used_classes(&deps.graph, self.config.metrics.most_used_limit),
            classes,
            project,
            duplicates,
            health,
        }
    }

    fn graph_phase(deps: &DependencyResult) -> GraphResult {
        GraphResult {
            metrics: graph_metrics(&deps.graph, deps.cycles.cycles.len()),
            topological_order: topological_order(&deps.graph.class_dependencies),
            edges: deps.graph.edges.clone(),
            package_dependencies: deps.graph.package_dependencies.clone(),
        }
    }

    /// Dependency graph, coupling, cycles and unused code
    pub fn analyze_dependencies(&self, root: &Path) -> Result<DependencyResult> {
        let output = self.load_nonempty(root)?;
        Ok(self.dependency_phase(&output.model, output.skipped))
    }

    /// Metrics, duplication and health
    pub fn analyze_metrics(&self, root: &Path) -> Result<MetricsResult> {
        let output = self.load_nonempty(root)?;
        let deps = self.dependency_phase(&output.model, output.skipped);
        Ok(self.metrics_phase(&output.model, &deps))
    }

    /// Graph metrics, topological order and typed edges
    pub fn analyze_graph(&self, root: &Path) -> Result<GraphResult> {
        let output = self.load_nonempty(root)?;
        let deps = self.dependency_phase(&output.model, output.skipped);
        Ok(Self::graph_phase(&deps))
    }

    /// Search the configured code patterns
    pub fn analyze_patterns(&self, root: &Path) -> Result<PatternSearchResult> {
        let output = self.load_nonempty(root)?;
        Ok(find_patterns(&output.model, &self.patterns))
    }

    /// Run a full analysis on an already-built model
    pub fn analyze_model(&self, model: &EntityModel, skipped: Vec<SkippedFile>) -> ProjectAnalysis {
        let started = Instant::now();
        let deps = self.dependency_phase(model, skipped);
        let metrics = self.metrics_phase(model, &deps);
        let graph = Self::graph_phase(&deps);
        let patterns = find_patterns(model, &self.patterns);
        let analysis_ms = started.elapsed().as_millis() as u64;

        ProjectAnalysis {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            diagnostics: deps.graph.diagnostics.clone(),
            dependencies: deps,
            metrics,
            graph,
            patterns,
            timing: AnalysisTiming {
                parse_ms: 0,
                analysis_ms,
                total_ms: analysis_ms,
            },
            ..Default::default()
        }
    }

    /// Full analysis, memoized per canonical project root
    pub fn analyze_all(&self, root: &Path) -> Result<Arc<ProjectAnalysis>> {
        let root = Self::canonical_root(root)?;
        if let Some(cached) = self.memo.get(&root) {
            debug!("Using memoized analysis for {}", root.display());
            return Ok(cached);
        }

        let disk = if self.disk_cache {
            Some((CacheDir::for_repo(&root)?, collect_files(&root, None)))
        } else {
            None
        };
        if let Some((cache_dir, files)) = &disk {
            match cache_dir.load_analysis(files) {
                Ok(Some(analysis)) => {
                    info!("Loaded cached analysis from {}", cache_dir.root.display());
                    let analysis = Arc::new(analysis);
                    self.memo.insert(root, Arc::clone(&analysis));
                    return Ok(analysis);
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring unreadable cache at {}: {}", cache_dir.root.display(), e),
            }
        }

        let started = Instant::now();
        let output = self.load_nonempty(&root)?;
        let parse_ms = started.elapsed().as_millis() as u64;

        let mut analysis = self.analyze_model(&output.model, output.skipped);
        analysis.project_root = root.display().to_string();
        analysis.files_parsed = output.files_parsed;
        analysis.timing.parse_ms = parse_ms;
        analysis.timing.total_ms = started.elapsed().as_millis() as u64;
        info!(
            "Analyzed {} entities in {} ms (health {:.1}, grade {})",
            output.model.len(),
            analysis.timing.total_ms,
            analysis.metrics.health.score,
            analysis.metrics.health.grade.as_str()
        );

        if let Some((cache_dir, files)) = &disk {
            if let Err(e) = cache_dir.save_analysis(&analysis, files) {
                warn!("Failed to write cache at {}: {}", cache_dir.root.display(), e);
            }
        }

        let analysis = Arc::new(analysis);
        self.memo.insert(root, Arc::clone(&analysis));
        Ok(analysis)
    }

    /// Entity counts without building the graph; an empty project yields zeros
    pub fn quick_summary(&self, root: &Path) -> Result<ProjectSummary> {
        let output = self.load(root)?;
        let mut summary = ProjectSummary::from_model(&output.model);
        summary.project_root = root.display().to_string();
        summary.files_parsed = output.files_parsed;
        summary.files_skipped = output.skipped.len();
        Ok(summary)
    }

    /// Discard memoized results
    pub fn clear_cache(&self) {
        self.memo.clear();
    }

    pub fn is_memoized(&self, root: &Path) -> bool {
        root.canonicalize()
            .map(|root| self.memo.get(&root).is_some())
            .unwrap_or(false)
    }
}

/// Format a full analysis as a text report
pub fn format_analysis_report(analysis: &ProjectAnalysis) -> String {
    let project = &analysis.metrics.project;
    let health = &analysis.metrics.health;
    let deps = &analysis.dependencies;
    let mut output = String::new();

    output.push_str("╔══════════════════════════════════════════════════════════════════╗\n");
    output.push_str("║                   DEPENDENCY ANALYSIS REPORT                     ║\n");
    output.push_str("╚══════════════════════════════════════════════════════════════════╝\n\n");

    output.push_str("── OVERVIEW ─────────────────────────────────────────────────────────\n");
    output.push_str(&format!("  Entities:          {:>6}\n", project.total_classes));
    output.push_str(&format!("  Methods:           {:>6}\n", project.total_methods));
    output.push_str(&format!("  Lines of Code:     {:>6}\n", project.total_lines_of_code));
    output.push_str(&format!("  Avg Complexity:    {:>6.1}\n", project.average_complexity));
    output.push_str(&format!("  Avg Maintain.:     {:>6.1}\n", project.average_maintainability));
    output.push_str(&format!("  Technical Debt:    {:>6.0}\n", project.technical_debt));
    output.push_str(&format!(
        "  Health:            {:>6.1} ({})\n",
        health.score,
        health.grade.as_str()
    ));
    output.push('\n');

    output.push_str("── COUPLING ─────────────────────────────────────────────────────────\n");
    output.push_str("  Entity                                     Ca    Ce   Instability\n");
    output.push_str("  ─────────────────────────────────────────────────────────────────\n");
    let mut coupled: Vec<_> = deps.coupling.entities.values().collect();
    coupled.sort_by(|a, b| {
        (b.afferent + b.efferent)
            .cmp(&(a.afferent + a.efferent))
            .then_with(|| a.entity.cmp(&b.entity))
    });
    for c in coupled.iter().take(15) {
        output.push_str(&format!(
            "  {:<40} {:>4}  {:>4}   {:>5.2} {}\n",
            abbreviate_qualified_name(&c.entity, 40),
            c.afferent,
            c.efferent,
            c.instability,
            c.band.as_str()
        ));
    }
    output.push('\n');

    if !deps.coupling.high_coupling.is_empty() {
        output.push_str("  High Coupling (many outgoing dependencies):\n");
        for (name, count) in deps.coupling.high_coupling.iter().take(5) {
            output.push_str(&format!("    {:<40} ({} dependencies)\n", abbreviate_qualified_name(name, 40), count));
        }
        output.push('\n');
    }

    if !deps.cycles.cycles.is_empty() || !deps.cycles.self_loops.is_empty() {
        output.push_str("── CIRCULAR DEPENDENCIES ────────────────────────────────────────────\n");
        for cycle in deps.cycles.cycles.iter().take(5) {
            output.push_str(&format!(
                "  ⚠ {} → {}\n",
                cycle.join(" → "),
                cycle.first().map(String::as_str).unwrap_or("")
            ));
        }
        if deps.cycles.cycles.len() > 5 {
            output.push_str(&format!("  ... and {} more\n", deps.cycles.cycles.len() - 5));
        }
        if !deps.cycles.self_loops.is_empty() {
            output.push_str(&format!("  Self-references: {}\n", deps.cycles.self_loops.len()));
        }
        output.push('\n');
    }

    if !analysis.metrics.duplicates.is_empty() {
        output.push_str("── DUPLICATION ──────────────────────────────────────────────────────\n");
        for group in analysis.metrics.duplicates.iter().take(5) {
            let label = if group.is_similar() {
                format!("similar {:.0}%", group.similarity * 100.0)
            } else {
                "exact".to_string()
            };
            output.push_str(&format!(
                "  [{}] {} methods, {} lines, impact {:.1}\n",
                label,
                group.members.len(),
                group.line_count,
                group.impact
            ));
            for member in &group.members {
                output.push_str(&format!("    {}\n", truncate_with_ellipsis(member, 60)));
            }
        }
        output.push_str(&format!("  Duplication ratio: {:.1}%\n\n", project.duplication_ratio * 100.0));
    }

    output.push_str("── UNUSED CODE ──────────────────────────────────────────────────────\n");
    output.push_str(&format!("  Unused classes: {}\n", deps.unused_classes.len()));
    for name in deps.unused_classes.iter().take(10) {
        output.push_str(&format!("    {}\n", name));
    }
    output.push_str(&format!("  Unused methods: {}\n", deps.unused_methods.len()));
    output.push('\n');

    if analysis.patterns.total_matches() > 0 {
        output.push_str("── PATTERNS ─────────────────────────────────────────────────────────\n");
        for (pattern, matches) in &analysis.patterns.matches {
            if !matches.is_empty() {
                output.push_str(&format!("  {:<18} {:>6}\n", pattern, matches.len()));
            }
        }
        output.push('\n');
    }

    if !health.recommendations.is_empty() {
        output.push_str("── RECOMMENDATIONS ──────────────────────────────────────────────────\n");
        for rec in &health.recommendations {
            output.push_str(&format!("  • {}\n", rec));
        }
        output.push('\n');
    }

    let diag = &analysis.diagnostics;
    if diag.unresolved_calls > 0 || diag.dropped_references > 0 || !diag.skipped_files.is_empty() {
        output.push_str(&format!(
            "  Diagnostics: {} unresolved calls, {} dropped references, {} skipped files\n\n",
            diag.unresolved_calls,
            diag.dropped_references,
            diag.skipped_files.len()
        ));
    }

    output.push_str("══════════════════════════════════════════════════════════════════════\n");
    output
}

/// Format a quick summary
pub fn format_summary(summary: &ProjectSummary) -> String {
    let mut output = String::new();
    output.push_str("── PROJECT SUMMARY ──────────────────────────────────────────────────\n");
    output.push_str(&format!("  Entities:          {:>6}\n", summary.total_entities));
    for (kind, count) in &summary.entities_by_kind {
        output.push_str(&format!("    {:<15} {:>6}\n", kind, count));
    }
    output.push_str(&format!("  Methods:           {:>6}\n", summary.total_methods));
    output.push_str(&format!("  Fields:            {:>6}\n", summary.total_fields));
    output.push_str(&format!("  Lines of Code:     {:>6}\n", summary.total_lines_of_code));
    output.push_str(&format!("  Packages:          {:>6}\n", summary.packages.len()));
    output.push_str(&format!(
        "  Files:             {:>6} parsed, {} skipped\n",
        summary.files_parsed, summary.files_skipped
    ));
    output
}
