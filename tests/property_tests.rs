//! Property tests for graph, coupling, cycle and metric invariants

mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::{assert_closed_path, assert_cycle_rotation, class_using, model_from_edges};
use depsight_engine::config::{CouplingConfig, CycleConfig, DuplicationConfig, EntryPointConfig};
use depsight_engine::duplication::similarity;
use depsight_engine::metrics::maintainability_index;
use depsight_engine::unused::find_unused_classes;
use depsight_engine::{
    calculate_coupling, detect_cycles, detect_duplicates, AnalyzerConfig, Analyzer, CycleStrategy,
    DefaultEntryPoints, DependencyGraph, EntityModel, HealthGrade, Member, MethodBody, Visibility,
};
use proptest::prelude::*;

const NODES: [&str; 6] = ["N0", "N1", "N2", "N3", "N4", "N5"];

fn edge_lists() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..NODES.len(), 0..NODES.len()), 0..20)
}

fn model_for(edges: &[(usize, usize)]) -> EntityModel {
    let mut adjacency: BTreeMap<&str, Vec<&str>> = NODES.iter().map(|n| (*n, Vec::new())).collect();
    for &(from, to) in edges {
        adjacency.entry(NODES[from]).or_default().push(NODES[to]);
    }
    let rows: Vec<(&str, &[&str])> = adjacency.iter().map(|(n, t)| (*n, t.as_slice())).collect();
    model_from_edges(&rows)
}

proptest! {
    #[test]
    fn test_coupling_totals_balance(edges in edge_lists()) {
        let graph = DependencyGraph::build(&model_for(&edges));
        let report = calculate_coupling(&graph.class_dependencies, &CouplingConfig::default());

        prop_assert_eq!(report.total_afferent(), report.total_efferent());
        for metrics in report.entities.values() {
            prop_assert!((0.0..=1.0).contains(&metrics.instability));
            if metrics.afferent + metrics.efferent == 0 {
                prop_assert_eq!(metrics.instability, 0.0);
            }
        }
    }

    #[test]
    fn test_dependency_implies_afferent(edges in edge_lists()) {
        let graph = DependencyGraph::build(&model_for(&edges));
        let report = calculate_coupling(&graph.class_dependencies, &CouplingConfig::default());

        for (source, targets) in &graph.class_dependencies {
            for target in targets {
                let dependents = graph.dependents_of(target);
                prop_assert!(dependents.contains(&source.as_str()));
                prop_assert!(report.entities[target].afferent >= 1);
            }
        }
    }

    #[test]
    fn test_cycles_are_closed_paths(edges in edge_lists()) {
        let graph = DependencyGraph::build(&model_for(&edges));
        for strategy in [CycleStrategy::Dfs, CycleStrategy::Complete] {
            let config = CycleConfig { strategy, ..Default::default() };
            let report = detect_cycles(&graph.class_dependencies, &config);
            for cycle in &report.cycles {
                assert_closed_path(cycle, &graph.class_dependencies);
                let distinct: BTreeSet<&String> = cycle.iter().collect();
                prop_assert_eq!(distinct.len(), cycle.len());
            }
            for node in &report.self_loops {
                prop_assert!(graph.class_dependencies[node].contains(node));
            }
        }
    }

    #[test]
    fn test_complete_finds_at_least_dfs(edges in edge_lists()) {
        let graph = DependencyGraph::build(&model_for(&edges));
        let dfs = detect_cycles(&graph.class_dependencies, &CycleConfig::default());
        let complete = detect_cycles(
            &graph.class_dependencies,
            &CycleConfig { strategy: CycleStrategy::Complete, ..Default::default() },
        );
        prop_assert!(complete.cycles.len() >= dfs.cycles.len());
        prop_assert_eq!(dfs.cycles.is_empty(), complete.cycles.is_empty());
    }

    #[test]
    fn test_maintainability_bounded(
        complexity in 0.0f64..10_000.0,
        loc in 0usize..100_000,
        methods in 0usize..500,
    ) {
        let mi = maintainability_index(complexity, loc, methods, 20);
        prop_assert!((0.0..=100.0).contains(&mi));
    }

    #[test]
    fn test_similarity_bounded(a in "[a-z ]{0,40}", b in "[a-z ]{0,40}") {
        let sim = similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&sim));
        prop_assert!((sim - similarity(&b, &a)).abs() < 1e-12);
    }

    #[test]
    fn test_identical_bodies_never_near(body in "[a-z(){}; ]{51,120}", copies in 2usize..5) {
        let bodies: Vec<MethodBody> = (0..copies)
            .map(|i| MethodBody { id: format!("p.C{}.m()", i), body: &body, line_count: 3, complexity: 1 })
            .collect();
        let groups = detect_duplicates(&bodies, &DuplicationConfig::default());
        prop_assert!(groups.iter().all(|g| !g.is_similar()));
        prop_assert_eq!(groups.len(), 1);
        prop_assert_eq!(groups[0].members.len(), copies);
    }

    #[test]
    fn test_main_entity_never_unused(edges in edge_lists(), main_node in 0..NODES.len()) {
        let mut model = EntityModel::new();
        for entity in model_for(&edges).iter() {
            let mut entity = entity.clone();
            if entity.name == NODES[main_node] {
                entity = entity.with_member(
                    Member::method("main", "void")
                        .with_visibility(Visibility::Public)
                        .with_static(true)
                        .with_parameter("args", "String[]"),
                );
            }
            model.insert(entity);
        }

        let graph = DependencyGraph::build(&model);
        let policy = DefaultEntryPoints::new(EntryPointConfig::default());
        let unused = find_unused_classes(&model, &graph.class_dependencies, &policy);
        let main_name = format!("p.{}", NODES[main_node]);
        prop_assert!(!unused.contains(&main_name));
    }
}

#[test]
fn test_three_cycle_instability() {
    let model = model_from_edges(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);
    let analysis = Analyzer::new(AnalyzerConfig::default()).analyze_model(&model, Vec::new());

    let cycles = &analysis.dependencies.cycles.cycles;
    assert_eq!(cycles.len(), 1);
    assert_cycle_rotation(&cycles[0], &["p.A", "p.B", "p.C"]);
    for name in ["p.A", "p.B", "p.C"] {
        assert!((analysis.dependencies.coupling.entities[name].instability - 0.5).abs() < 1e-9);
    }
}

#[test]
fn test_empty_input_health() {
    let analysis = Analyzer::new(AnalyzerConfig::default()).analyze_model(&EntityModel::new(), Vec::new());

    assert!(analysis.dependencies.graph.class_dependencies.is_empty());
    assert!(analysis.dependencies.cycles.cycles.is_empty());
    assert!(analysis.metrics.duplicates.is_empty());
    assert_eq!(analysis.metrics.health.score, 100.0);
    assert_eq!(analysis.metrics.health.grade, HealthGrade::A);
    assert!(!analysis.metrics.project.average_complexity.is_nan());
    assert_eq!(analysis.graph.metrics.density, 0.0);
}

#[test]
fn test_isolated_entity_zero_instability() {
    let model: EntityModel = [class_using("Alone", &[])].into_iter().collect();
    let graph = DependencyGraph::build(&model);
    let report = calculate_coupling(&graph.class_dependencies, &CouplingConfig::default());
    assert_eq!(report.entities["p.Alone"].instability, 0.0);
}
