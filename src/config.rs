//! Analyzer configuration
//!
//! Every policy constant the analysis phases use lives here. Configuration is
//! read from `depsight.toml` in the project root (or an explicit `--config`
//! file) and then overridden by command-line flags.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::patterns::patterns_by_name;

/// File name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "depsight.toml";

/// Top-level analyzer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub duplication: DuplicationConfig,
    pub coupling: CouplingConfig,
    pub metrics: MetricsConfig,
    pub entry_points: EntryPointConfig,
    pub cycles: CycleConfig,
    pub parallel: ParallelConfig,
    pub patterns: PatternConfig,
}

/// Duplicate and near-duplicate detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicationConfig {
    /// Similarity strictly above which two bodies form a near group
    pub similarity_threshold: f64,
    /// Normalized bodies must be longer than this to form an exact group
    pub min_body_length: usize,
    /// Skip the pairwise near-duplicate pass entirely
    pub detect_similar: bool,
}

impl Default for DuplicationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            min_body_length: 50,
            detect_similar: true,
        }
    }
}

/// Coupling report thresholds and stability bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingConfig {
    /// Efferent coupling above which an entity is listed as highly coupled
    pub high_coupling_threshold: usize,
    /// Instability above which an entity is listed as unstable
    pub unstable_threshold: f64,
    /// Length of the most-unstable list
    pub most_unstable_limit: usize,
    /// Upper bounds of the very-stable, stable, balanced and unstable bands
    pub stability_bands: [f64; 4],
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            high_coupling_threshold: 10,
            unstable_threshold: 0.8,
            most_unstable_limit: 10,
            stability_bands: [0.4, 0.6, 0.8, 0.9],
        }
    }
}

/// Metrics aggregation thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Complexity sum above which an entity adds 10 debt points
    pub complexity_debt_threshold: usize,
    /// Maintainability index below which an entity adds 5 debt points
    pub maintainability_debt_threshold: f64,
    /// Methods per entity before the maintainability penalty applies
    pub method_count_penalty_after: usize,
    /// Length of the most-used classes list
    pub most_used_limit: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            complexity_debt_threshold: 20,
            maintainability_debt_threshold: 50.0,
            method_count_penalty_after: 20,
            most_used_limit: 20,
        }
    }
}

/// Entry-point heuristics for unused-code detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryPointConfig {
    /// Entities carrying one of these annotations are framework-managed
    pub annotations: Vec<String>,
    /// Methods carrying one of these annotations are invoked by a container
    pub method_annotations: Vec<String>,
    /// Simple-name suffixes that mark test classes
    pub test_suffixes: Vec<String>,
    /// Path fragment that marks test sources
    pub test_path_marker: String,
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            annotations: [
                "Component",
                "Service",
                "Repository",
                "Controller",
                "RestController",
                "Configuration",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            method_annotations: [
                "PostConstruct",
                "PreDestroy",
                "EventListener",
                "Test",
                "Bean",
                "Override",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            test_suffixes: vec!["Test".to_string(), "Tests".to_string()],
            test_path_marker: "/test/".to_string(),
        }
    }
}

/// Cycle enumeration strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStrategy {
    /// Single DFS pass; may miss cycles in overlapping components
    #[default]
    Dfs,
    /// SCC decomposition followed by elementary-cycle enumeration
    Complete,
}

impl CycleStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dfs => "dfs",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub strategy: CycleStrategy,
    /// Upper bound on cycles reported by the complete strategy
    pub max_cycles: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            strategy: CycleStrategy::Dfs,
            max_cycles: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Parse files on a rayon pool
    pub enabled: bool,
    /// Pool size; 0 uses the available parallelism
    pub threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threads: 0,
        }
    }
}

/// Code-pattern search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Built-in patterns to search for, by name
    pub enabled: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            enabled: ["Singleton", "Factory", "GetterSetter", "TestClass"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AnalyzerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve configuration for a project: explicit file, then
    /// `depsight.toml` in the root, then defaults.
    pub fn resolve(project_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading config from {}", path.display());
            return Self::load_from_file(path);
        }

        let candidate = project_root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            debug!("Loading config from {}", candidate.display());
            return Self::load_from_file(candidate);
        }

        Ok(Self::default())
    }

    /// Reject values no analysis phase can work with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.duplication.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(EngineError::Config {
                message: format!("similarity_threshold must be within [0, 1], got {}", threshold),
            });
        }

        let bands = &self.coupling.stability_bands;
        if bands.windows(2).any(|w| w[0] > w[1]) || bands.iter().any(|b| !(0.0..=1.0).contains(b)) {
            return Err(EngineError::Config {
                message: "stability_bands must be ascending values within [0, 1]".to_string(),
            });
        }

        patterns_by_name(&self.patterns.enabled)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.duplication.min_body_length, 50);
        assert!((config.duplication.similarity_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.coupling.stability_bands, [0.4, 0.6, 0.8, 0.9]);
        assert_eq!(config.cycles.strategy, CycleStrategy::Dfs);
        assert!(config.entry_points.annotations.contains(&"Service".to_string()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyzerConfig::from_toml_str(
            r#"
            [duplication]
            min_body_length = 80

            [cycles]
            strategy = "complete"
            "#,
        )
        .unwrap();

        assert_eq!(config.duplication.min_body_length, 80);
        assert!((config.duplication.similarity_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.cycles.strategy, CycleStrategy::Complete);
        assert_eq!(config.coupling.high_coupling_threshold, 10);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = AnalyzerConfig::from_toml_str("[duplication]\nsimilarity_threshold = 1.5\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn test_pattern_selection() {
        let config = AnalyzerConfig::from_toml_str("[patterns]\nenabled = [\"Singleton\"]\n").unwrap();
        assert_eq!(config.patterns.enabled, vec!["Singleton"]);
        assert_eq!(AnalyzerConfig::default().patterns.enabled.len(), 4);

        let err = AnalyzerConfig::from_toml_str("[patterns]\nenabled = [\"Visitor\"]\n").unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn test_resolve_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalyzerConfig::resolve(dir.path(), None).unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }
}
