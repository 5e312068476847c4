//! Analysis command handlers

use serde::Serialize;

use crate::analysis::{
    format_analysis_report, format_summary, Analyzer, DependencyResult, GraphResult, MetricsResult,
};
use crate::cli::{AnalyzeArgs, OutputFormat, ProjectArgs};
use crate::commands::{export_json, CommandContext, ExportReport};
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::patterns::PatternSearchResult;
use crate::utils::abbreviate_qualified_name;

fn build_analyzer(args: &AnalyzeArgs, ctx: &CommandContext) -> Result<Analyzer> {
    let mut config = AnalyzerConfig::resolve(&args.project, ctx.config_path.as_deref())?;
    args.apply(&mut config)?;
    Ok(Analyzer::new(config).with_disk_cache(args.cache))
}

fn render<T: Serialize>(ctx: &CommandContext, value: &T, text: impl FnOnce() -> String) -> Result<String> {
    match ctx.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => Ok(text()),
    }
}

fn with_exports(mut output: String, exports: &ExportReport) -> String {
    let described = exports.describe();
    if !described.is_empty() {
        output.push('\n');
        output.push_str(&described);
    }
    output
}

pub fn run_dependency(args: &AnalyzeArgs, ctx: &CommandContext) -> Result<String> {
    let analyzer = build_analyzer(args, ctx)?;
    let result = analyzer.analyze_dependencies(&args.project)?;

    let mut exports = ExportReport::default();
    if !args.no_export {
        exports.record(export_json(&ctx.output_dir, "dependencies.json", &result));
    }

    let output = render(ctx, &result, || format_dependencies(&result))?;
    Ok(with_exports(output, &exports))
}

pub fn run_metrics(args: &AnalyzeArgs, ctx: &CommandContext) -> Result<String> {
    let analyzer = build_analyzer(args, ctx)?;
    let result = analyzer.analyze_metrics(&args.project)?;

    let mut exports = ExportReport::default();
    if !args.no_export {
        exports.record(export_json(&ctx.output_dir, "metrics.json", &result));
    }

    let output = render(ctx, &result, || format_metrics(&result))?;
    Ok(with_exports(output, &exports))
}

pub fn run_graph(args: &AnalyzeArgs, ctx: &CommandContext) -> Result<String> {
    let analyzer = build_analyzer(args, ctx)?;
    let result = analyzer.analyze_graph(&args.project)?;

    let mut exports = ExportReport::default();
    if !args.no_export {
        exports.record(export_json(&ctx.output_dir, "graph.json", &result));
    }

    let output = render(ctx, &result, || format_graph(&result))?;
    Ok(with_exports(output, &exports))
}

pub fn run_patterns(args: &AnalyzeArgs, ctx: &CommandContext) -> Result<String> {
    let analyzer = build_analyzer(args, ctx)?;
    let result = analyzer.analyze_patterns(&args.project)?;

    let mut exports = ExportReport::default();
    if !args.no_export {
        exports.record(export_json(&ctx.output_dir, "patterns.json", &result));
    }

    let output = render(ctx, &result, || format_patterns(&result))?;
    Ok(with_exports(output, &exports))
}

pub fn run_all(args: &AnalyzeArgs, ctx: &CommandContext) -> Result<String> {
    let analyzer = build_analyzer(args, ctx)?;
    let analysis = analyzer.analyze_all(&args.project)?;

    let mut exports = ExportReport::default();
    if !args.no_export {
        let dir = &ctx.output_dir;
        exports.record(export_json(dir, "dependencies.json", &analysis.dependencies));
        exports.record(export_json(dir, "metrics.json", &analysis.metrics));
        exports.record(export_json(dir, "graph.json", &analysis.graph));
        exports.record(export_json(dir, "patterns.json", &analysis.patterns));
        exports.record(export_json(dir, "analysis.json", analysis.as_ref()));
    }

    let output = render(ctx, analysis.as_ref(), || format_analysis_report(&analysis))?;
    Ok(with_exports(output, &exports))
}

pub fn run_summary(args: &ProjectArgs, ctx: &CommandContext) -> Result<String> {
    let config = AnalyzerConfig::resolve(&args.project, ctx.config_path.as_deref())?;
    let summary = Analyzer::new(config).quick_summary(&args.project)?;
    render(ctx, &summary, || format_summary(&summary))
}

fn format_dependencies(result: &DependencyResult) -> String {
    let mut output = String::new();
    output.push_str("── DEPENDENCIES ─────────────────────────────────────────────────────\n");
    output.push_str(&format!("  Entities:          {:>6}\n", result.graph.node_count()));
    output.push_str(&format!("  Dependencies:      {:>6}\n", result.graph.edge_count()));
    output.push_str(&format!("  Packages:          {:>6}\n", result.graph.package_dependencies.len()));
    output.push_str(&format!("  Cycles:            {:>6}\n", result.cycles.cycles.len()));
    output.push_str(&format!("  Self-references:   {:>6}\n", result.cycles.self_loops.len()));
    output.push_str(&format!("  Unused classes:    {:>6}\n", result.unused_classes.len()));
    output.push_str(&format!("  Unused methods:    {:>6}\n", result.unused_methods.len()));

    if !result.coupling.most_unstable.is_empty() {
        output.push_str("\n  Most unstable:\n");
        for (name, instability) in &result.coupling.most_unstable {
            output.push_str(&format!("    {:<40} {:.2}\n", abbreviate_qualified_name(name, 40), instability));
        }
    }
    for cycle in result.cycles.cycles.iter().take(5) {
        output.push_str(&format!("  ⚠ cycle: {}\n", cycle.join(" → ")));
    }
    output
}

fn format_metrics(result: &MetricsResult) -> String {
    let project = &result.project;
    let mut output = String::new();
    output.push_str("── METRICS ──────────────────────────────────────────────────────────\n");
    output.push_str(&format!("  Classes:           {:>6}\n", project.total_classes));
    output.push_str(&format!("  Methods:           {:>6}\n", project.total_methods));
    output.push_str(&format!("  Lines of Code:     {:>6}\n", project.total_lines_of_code));
    output.push_str(&format!("  Avg Complexity:    {:>6.1}\n", project.average_complexity));
    output.push_str(&format!("  Avg Maintain.:     {:>6.1}\n", project.average_maintainability));
    output.push_str(&format!("  Duplication:       {:>5.1}%\n", project.duplication_ratio * 100.0));
    output.push_str(&format!("  Code Reuse:        {:>5.1}%\n", project.code_reuse * 100.0));
    output.push_str(&format!("  Technical Debt:    {:>6.0}\n", project.technical_debt));
    output.push_str(&format!(
        "  Health:            {:>6.1} ({})\n",
        result.health.score,
        result.health.grade.as_str()
    ));

    if !result.most_used_classes.is_empty() {
        output.push_str("\n  Most used:\n");
        for (name, count) in result.most_used_classes.iter().take(10) {
            output.push_str(&format!("    {:<40} {:>4}\n", abbreviate_qualified_name(name, 40), count));
        }
    }
    output
}

fn format_graph(result: &GraphResult) -> String {
    let mut output = String::new();
    output.push_str("── GRAPH ────────────────────────────────────────────────────────────\n");
    output.push_str(&format!("  Nodes:             {:>6}\n", result.metrics.node_count));
    output.push_str(&format!("  Edges:             {:>6}\n", result.metrics.edge_count));
    output.push_str(&format!("  Density:           {:>6.3}\n", result.metrics.density));
    output.push_str(&format!("  Cycles:            {:>6}\n", result.metrics.circular_dependencies));
    output.push_str(&format!("  Typed edges:       {:>6}\n", result.edges.len()));
    output
}

fn format_patterns(result: &PatternSearchResult) -> String {
    let mut output = String::new();
    output.push_str("── PATTERNS ─────────────────────────────────────────────────────────\n");
    for (pattern, matches) in &result.matches {
        output.push_str(&format!("  {:<18} {:>6}\n", pattern, matches.len()));
        for m in matches.iter().take(10) {
            output.push_str(&format!(
                "    {:<50} {}\n",
                abbreviate_qualified_name(&m.element, 50),
                m.kind.as_str()
            ));
        }
        if matches.len() > 10 {
            output.push_str(&format!("    ... and {} more\n", matches.len() - 10));
        }
    }
    output.push_str(&format!("  Total matches:     {:>6}\n", result.total_matches()));
    output
}
