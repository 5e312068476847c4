//! Coupling and instability
//!
//! Afferent coupling (Ca) counts the distinct entities depending on an entity,
//! efferent coupling (Ce) the entities it depends on. Instability is
//! `Ce / (Ca + Ce)`: 0 is maximally stable, 1 maximally unstable.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::CouplingConfig;

/// Stability band derived from instability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StabilityBand {
    #[default]
    VeryStable,
    Stable,
    Balanced,
    Unstable,
    VeryUnstable,
}

impl StabilityBand {
    /// Place an instability value using the four ascending cut points
    pub fn classify(instability: f64, bands: &[f64; 4]) -> Self {
        if instability < bands[0] {
            Self::VeryStable
        } else if instability < bands[1] {
            Self::Stable
        } else if instability < bands[2] {
            Self::Balanced
        } else if instability < bands[3] {
            Self::Unstable
        } else {
            Self::VeryUnstable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryStable => "very-stable",
            Self::Stable => "stable",
            Self::Balanced => "balanced",
            Self::Unstable => "unstable",
            Self::VeryUnstable => "very-unstable",
        }
    }
}

/// Coupling figures of one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouplingMetrics {
    /// Fully-qualified entity name
    pub entity: String,
    /// Afferent coupling: distinct entities depending on this one
    pub afferent: usize,
    /// Efferent coupling: distinct entities this one depends on
    pub efferent: usize,
    /// Ce / (Ca + Ce), exactly 0.0 when both are zero
    pub instability: f64,
    pub band: StabilityBand,
}

impl CouplingMetrics {
    /// Calculate instability metric (Ce / (Ca + Ce))
    pub fn instability_of(afferent: usize, efferent: usize) -> f64 {
        let total = afferent + efferent;
        if total == 0 {
            0.0
        } else {
            efferent as f64 / total as f64
        }
    }
}

/// Coupling over a whole snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouplingReport {
    /// Per-entity metrics keyed by qualified name
    pub entities: BTreeMap<String, CouplingMetrics>,
    /// Entities whose Ce exceeds the high-coupling threshold, highest first
    pub high_coupling: Vec<(String, usize)>,
    /// Entities whose instability exceeds the unstable threshold, highest first
    pub most_unstable: Vec<(String, f64)>,
}

impl CouplingReport {
    pub fn get(&self, entity: &str) -> Option<&CouplingMetrics> {
        self.entities.get(entity)
    }

    pub fn total_afferent(&self) -> usize {
        self.entities.values().map(|m| m.afferent).sum()
    }

    pub fn total_efferent(&self) -> usize {
        self.entities.values().map(|m| m.efferent).sum()
    }
}

/// Compute coupling for every key of `class_dependencies`
///
/// A self-dependency counts once on each side.
pub fn calculate_coupling(
    class_dependencies: &BTreeMap<String, BTreeSet<String>>,
    config: &CouplingConfig,
) -> CouplingReport {
    let mut afferent: BTreeMap<&str, usize> = class_dependencies
        .keys()
        .map(|name| (name.as_str(), 0))
        .collect();

    for targets in class_dependencies.values() {
        for target in targets {
            if let Some(count) = afferent.get_mut(target.as_str()) {
                *count += 1;
            }
        }
    }

    let mut report = CouplingReport::default();
    for (name, targets) in class_dependencies {
        let efferent = targets
            .iter()
            .filter(|t| class_dependencies.contains_key(*t))
            .count();
        let afferent = afferent.get(name.as_str()).copied().unwrap_or(0);
        let instability = CouplingMetrics::instability_of(afferent, efferent);

        report.entities.insert(
            name.clone(),
            CouplingMetrics {
                entity: name.clone(),
                afferent,
                efferent,
                instability,
                band: StabilityBand::classify(instability, &config.stability_bands),
            },
        );
    }

    let mut high: Vec<(String, usize)> = report
        .entities
        .values()
        .filter(|m| m.efferent > config.high_coupling_threshold)
        .map(|m| (m.entity.clone(), m.efferent))
        .collect();
    high.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    report.high_coupling = high;

    let mut unstable: Vec<(String, f64)> = report
        .entities
        .values()
        .filter(|m| m.instability > config.unstable_threshold)
        .map(|m| (m.entity.clone(), m.instability))
        .collect();
    unstable.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    unstable.truncate(config.most_unstable_limit);
    report.most_unstable = unstable;

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(edges: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        edges
            .iter()
            .map(|(source, targets)| {
                (
                    source.to_string(),
                    targets.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_instability() {
        assert!((CouplingMetrics::instability_of(10, 10) - 0.5).abs() < 0.01);
        assert!((CouplingMetrics::instability_of(0, 10) - 1.0).abs() < 0.01);
        assert_eq!(CouplingMetrics::instability_of(0, 0), 0.0);
    }

    #[test]
    fn test_afferent_and_efferent() {
        let graph = deps(&[("A", &["B", "C"]), ("B", &["C"]), ("C", &[])]);
        let report = calculate_coupling(&graph, &CouplingConfig::default());

        let a = report.get("A").unwrap();
        assert_eq!((a.afferent, a.efferent), (0, 2));
        assert_eq!(a.instability, 1.0);

        let c = report.get("C").unwrap();
        assert_eq!((c.afferent, c.efferent), (2, 0));
        assert_eq!(c.instability, 0.0);
        assert_eq!(c.band, StabilityBand::VeryStable);

        assert_eq!(report.total_afferent(), report.total_efferent());
    }

    #[test]
    fn test_isolated_and_self_dependency() {
        let graph = deps(&[("Lonely", &[]), ("Selfish", &["Selfish"])]);
        let report = calculate_coupling(&graph, &CouplingConfig::default());
        assert_eq!(report.get("Lonely").unwrap().instability, 0.0);

        let selfish = report.get("Selfish").unwrap();
        assert_eq!((selfish.afferent, selfish.efferent), (1, 1));
        assert_eq!(selfish.instability, 0.5);
    }

    #[test]
    fn test_stability_bands() {
        let bands = [0.4, 0.6, 0.8, 0.9];
        assert_eq!(StabilityBand::classify(0.0, &bands), StabilityBand::VeryStable);
        assert_eq!(StabilityBand::classify(0.5, &bands), StabilityBand::Stable);
        assert_eq!(StabilityBand::classify(0.6, &bands), StabilityBand::Balanced);
        assert_eq!(StabilityBand::classify(0.85, &bands), StabilityBand::Unstable);
        assert_eq!(StabilityBand::classify(1.0, &bands), StabilityBand::VeryUnstable);
    }

    #[test]
    fn test_high_coupling_list() {
        let targets: Vec<String> = (0..12).map(|i| format!("T{}", i)).collect();
        let mut graph: BTreeMap<String, BTreeSet<String>> =
            targets.iter().map(|t| (t.clone(), BTreeSet::new())).collect();
        graph.insert("Hub".to_string(), targets.iter().cloned().collect());

        let report = calculate_coupling(&graph, &CouplingConfig::default());
        assert_eq!(report.high_coupling, vec![("Hub".to_string(), 12)]);
        assert_eq!(report.most_unstable, vec![("Hub".to_string(), 1.0)]);
    }
}
