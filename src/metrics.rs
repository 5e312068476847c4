//! Metrics aggregation
//!
//! Per-entity records (size, complexity, coupling, cohesion, maintainability,
//! usage) and the project-level roll-up: duplication ratio, code reuse,
//! technical debt and the health grade.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::MetricsConfig;
use crate::coupling::CouplingReport;
use crate::duplication::DuplicationGroup;
use crate::graph::DependencyGraph;
use crate::schema::{Entity, EntityModel};

/// Metrics of one entity, computed once per run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Fully-qualified entity name
    pub entity: String,
    pub method_count: usize,
    pub field_count: usize,
    /// Sum of method cyclomatic complexities
    pub complexity: usize,
    pub afferent_coupling: usize,
    pub efferent_coupling: usize,
    /// Lack of cohesion: share of method pairs with no accessed field in common
    pub lack_of_cohesion: f64,
    /// 0-100, higher is easier to maintain
    pub maintainability_index: f64,
    /// Lines spanned by methods and constructors
    pub lines_of_code: usize,
    /// References from other entities
    pub usage_count: usize,
}

/// Maintainability index clamped to [0, 100]
///
/// `171 - 5.2 ln(C) - 0.23 C - 16.2 ln(LOC)`, minus 0.5 per method beyond
/// `penalty_after`; 100 when there is no code.
pub fn maintainability_index(complexity: f64, loc: usize, method_count: usize, penalty_after: usize) -> f64 {
    if loc == 0 {
        return 100.0;
    }

    let complexity = complexity.max(1.0);
    let mut mi = 171.0 - 5.2 * complexity.ln() - 0.23 * complexity - 16.2 * (loc as f64).ln();
    if method_count > penalty_after {
        mi -= (method_count - penalty_after) as f64 * 0.5;
    }

    mi.clamp(0.0, 100.0)
}

/// LCOM-style estimate in [0, 1]; 0.0 with at most one method or no fields
pub fn lack_of_cohesion(entity: &Entity) -> f64 {
    let methods: Vec<BTreeSet<&str>> = entity
        .methods()
        .map(|m| m.accessed_fields.iter().map(String::as_str).collect())
        .collect();

    if methods.len() <= 1 || entity.fields().next().is_none() {
        return 0.0;
    }

    let mut pairs = 0usize;
    let mut disjoint = 0usize;
    for i in 0..methods.len() {
        for j in (i + 1)..methods.len() {
            pairs += 1;
            if methods[i].is_disjoint(&methods[j]) {
                disjoint += 1;
            }
        }
    }

    disjoint as f64 / pairs as f64
}

/// Compute per-entity metrics in entity-name order
pub fn class_metrics(
    model: &EntityModel,
    graph: &DependencyGraph,
    coupling: &CouplingReport,
    config: &MetricsConfig,
) -> Vec<ClassMetrics> {
    model
        .iter()
        .map(|entity| {
            let method_count = entity.methods().count();
            let complexity: usize = entity.methods().map(|m| m.complexity.max(1)).sum();
            let lines_of_code: usize = entity.callables().map(|m| m.line_count).sum();
            let (afferent, efferent) = coupling
                .get(&entity.qualified_name)
                .map(|c| (c.afferent, c.efferent))
                .unwrap_or((0, 0));

            ClassMetrics {
                entity: entity.qualified_name.clone(),
                method_count,
                field_count: entity.fields().count(),
                complexity,
                afferent_coupling: afferent,
                efferent_coupling: efferent,
                lack_of_cohesion: lack_of_cohesion(entity),
                maintainability_index: maintainability_index(
                    complexity as f64,
                    lines_of_code,
                    method_count,
                    config.method_count_penalty_after,
                ),
                lines_of_code,
                usage_count: graph
                    .usage_counts
                    .get(&entity.qualified_name)
                    .copied()
                    .unwrap_or(0),
            }
        })
        .collect()
}

/// How often a method is called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageLevel {
    Unused,
    Rarely,
    Occasionally,
    Frequently,
    Heavily,
}

impl UsageLevel {
    pub fn classify(call_count: usize) -> Self {
        match call_count {
            0 => Self::Unused,
            1 => Self::Rarely,
            2..=4 => Self::Occasionally,
            5..=19 => Self::Frequently,
            _ => Self::Heavily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "Unused",
            Self::Rarely => "Rarely Used",
            Self::Occasionally => "Occasionally Used",
            Self::Frequently => "Frequently Used",
            Self::Heavily => "Heavily Used",
        }
    }
}

/// Call statistics of one `Target.method`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodUsage {
    pub method: String,
    pub call_count: usize,
    /// Entities containing at least one call site
    pub callers: BTreeSet<String>,
    pub level: UsageLevel,
}

/// Every called method, most called first
pub fn method_usage(graph: &DependencyGraph) -> Vec<MethodUsage> {
    let mut usages: Vec<MethodUsage> = graph
        .call_counts
        .iter()
        .map(|(method, &call_count)| MethodUsage {
            method: method.clone(),
            call_count,
            callers: graph.callers.get(method).cloned().unwrap_or_default(),
            level: UsageLevel::classify(call_count),
        })
        .collect();
    usages.sort_by(|a, b| b.call_count.cmp(&a.call_count).then_with(|| a.method.cmp(&b.method)));
    usages
}

/// Entities with the most references from other entities
pub fn most_used_classes(graph: &DependencyGraph, limit: usize) -> Vec<(String, usize)> {
    let mut used: Vec<(String, usize)> = graph
        .usage_counts
        .iter()
        .filter(|(_, &count)| count > 0)
        .map(|(name, &count)| (name.clone(), count))
        .collect();
    used.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    used.truncate(limit);
    used
}

/// Project-level roll-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub total_classes: usize,
    pub total_methods: usize,
    pub total_lines_of_code: usize,
    /// Mean per-entity complexity sum
    pub average_complexity: f64,
    /// Mean maintainability index; 100 for an empty project
    pub average_maintainability: f64,
    /// Duplicated lines / total lines
    pub duplication_ratio: f64,
    /// Methods called more than once / total methods
    pub code_reuse: f64,
    pub unused_methods: usize,
    pub unused_classes: usize,
    pub technical_debt: f64,
}

/// Inputs of the project roll-up
pub struct ProjectInputs<'a> {
    pub model: &'a EntityModel,
    pub classes: &'a [ClassMetrics],
    pub duplicates: &'a [DuplicationGroup],
    pub call_counts: &'a BTreeMap<String, usize>,
    pub unused_methods: usize,
    pub unused_classes: usize,
}

pub fn project_metrics(inputs: &ProjectInputs<'_>, config: &MetricsConfig) -> ProjectMetrics {
    let classes = inputs.classes;
    let total_classes = classes.len();
    let total_methods: usize = classes.iter().map(|c| c.method_count).sum();
    let total_loc: usize = classes.iter().map(|c| c.lines_of_code).sum();

    let (average_complexity, average_maintainability) = if total_classes == 0 {
        (0.0, 100.0)
    } else {
        (
            classes.iter().map(|c| c.complexity as f64).sum::<f64>() / total_classes as f64,
            classes.iter().map(|c| c.maintainability_index).sum::<f64>() / total_classes as f64,
        )
    };

    let duplicated_lines: usize = inputs.duplicates.iter().map(|d| d.duplicated_lines()).sum();
    let duplication_ratio = if total_loc > 0 {
        duplicated_lines as f64 / total_loc as f64
    } else {
        0.0
    };

    let reused: BTreeSet<String> = inputs
        .model
        .iter()
        .flat_map(|entity| entity.methods().map(move |m| entity.member_key(m)))
        .filter(|key| inputs.call_counts.get(key).copied().unwrap_or(0) > 1)
        .collect();
    let code_reuse = if total_methods > 0 {
        reused.len() as f64 / total_methods as f64
    } else {
        0.0
    };

    ProjectMetrics {
        total_classes,
        total_methods,
        total_lines_of_code: total_loc,
        average_complexity,
        average_maintainability,
        duplication_ratio,
        code_reuse,
        unused_methods: inputs.unused_methods,
        unused_classes: inputs.unused_classes,
        technical_debt: technical_debt(
            classes,
            inputs.duplicates.len(),
            inputs.unused_methods,
            inputs.unused_classes,
            config,
        ),
    }
}

/// `10·complex + 5·hard-to-maintain + 3·duplicate groups + unused methods + 2·unused classes`
pub fn technical_debt(
    classes: &[ClassMetrics],
    duplicate_groups: usize,
    unused_methods: usize,
    unused_classes: usize,
    config: &MetricsConfig,
) -> f64 {
    let complex = classes
        .iter()
        .filter(|c| c.complexity > config.complexity_debt_threshold)
        .count();
    let hard_to_maintain = classes
        .iter()
        .filter(|c| c.maintainability_index < config.maintainability_debt_threshold)
        .count();

    (complex * 10 + hard_to_maintain * 5 + duplicate_groups * 3 + unused_methods + unused_classes * 2) as f64
}

/// Letter grade of a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthGrade {
    A,
    B,
    C,
    D,
    F,
}

impl HealthGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::A
        } else if score >= 80.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else {
            Self::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

/// A structural risk worth acting on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRisk {
    pub level: RiskLevel,
    pub category: String,
    pub description: String,
    pub mitigation: String,
}

/// Overall health of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub score: f64,
    pub grade: HealthGrade,
    pub recommendations: Vec<String>,
    pub risks: Vec<ProjectRisk>,
}

impl Default for HealthAssessment {
    fn default() -> Self {
        Self {
            score: 100.0,
            grade: HealthGrade::A,
            recommendations: Vec::new(),
            risks: Vec::new(),
        }
    }
}

/// Health score: half structural (cycles and duplication), half maintainability
pub fn assess_health(cycles: usize, duplicate_groups: usize, project: &ProjectMetrics) -> HealthAssessment {
    let structural = (100.0 - 5.0 * cycles as f64 - 2.0 * duplicate_groups as f64).max(0.0);
    let score = (0.5 * structural + 0.5 * project.average_maintainability).clamp(0.0, 100.0);

    let mut recommendations = Vec::new();
    let mut risks = Vec::new();

    if cycles > 0 {
        recommendations.push("Refactor circular dependencies to improve architecture".to_string());
        risks.push(ProjectRisk {
            level: RiskLevel::High,
            category: "Architecture".to_string(),
            description: format!("{} circular dependencies detected", cycles),
            mitigation: "Break dependency cycles by introducing interfaces".to_string(),
        });
    }
    if duplicate_groups > 0 {
        recommendations.push("Extract common code to reduce duplication".to_string());
    }
    if project.average_complexity > 10.0 {
        recommendations.push("Refactor complex methods to reduce cyclomatic complexity".to_string());
    }
    if project.average_complexity > 15.0 {
        risks.push(ProjectRisk {
            level: RiskLevel::Medium,
            category: "Complexity".to_string(),
            description: "High average cyclomatic complexity".to_string(),
            mitigation: "Simplify complex methods".to_string(),
        });
    }
    if project.average_maintainability < 50.0 {
        recommendations.push("Improve maintainability by splitting large classes and reducing coupling".to_string());
    }
    if project.unused_classes > 0 || project.unused_methods > 0 {
        recommendations.push(format!(
            "Remove unused code ({} classes, {} methods)",
            project.unused_classes, project.unused_methods
        ));
        risks.push(ProjectRisk {
            level: RiskLevel::Low,
            category: "Dead code".to_string(),
            description: "Unreferenced classes or methods".to_string(),
            mitigation: "Delete or document the unused code".to_string(),
        });
    }

    HealthAssessment {
        score,
        grade: HealthGrade::from_score(score),
        recommendations,
        risks,
    }
}

/// Size and density of the entity graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    /// E / (N (N - 1)), 0 for N <= 1
    pub density: f64,
    pub circular_dependencies: usize,
}

pub fn graph_metrics(graph: &DependencyGraph, circular_dependencies: usize) -> GraphMetrics {
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();
    let density = if node_count > 1 {
        edge_count as f64 / (node_count * (node_count - 1)) as f64
    } else {
        0.0
    };

    GraphMetrics {
        node_count,
        edge_count,
        density,
        circular_dependencies,
    }
}
