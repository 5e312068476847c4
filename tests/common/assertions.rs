//! Model builders and result assertions

use depsight_engine::{Entity, EntityKind, EntityModel, Member, Reference, Visibility};

/// Class `p.<name>` whose single method references each target by instantiation
pub fn class_using(name: &str, targets: &[&str]) -> Entity {
    let mut method = Member::method("run", "void").with_visibility(Visibility::Public);
    for target in targets {
        method = method.with_reference(Reference::instantiation(target).resolved_as(&format!("p.{}", target)));
    }
    Entity::new(EntityKind::Class, "p", name, &format!("src/p/{}.java", name)).with_member(method)
}

/// Model from `(name, [targets])` adjacency
pub fn model_from_edges(edges: &[(&str, &[&str])]) -> EntityModel {
    edges.iter().map(|(name, targets)| class_using(name, targets)).collect()
}

/// Assert that `cycle` is a rotation of `expected`
pub fn assert_cycle_rotation(cycle: &[String], expected: &[&str]) {
    assert_eq!(cycle.len(), expected.len(), "cycle {:?} vs {:?}", cycle, expected);
    let start = cycle
        .iter()
        .position(|n| n == expected[0])
        .unwrap_or_else(|| panic!("{} not in cycle {:?}", expected[0], cycle));
    for (i, name) in expected.iter().enumerate() {
        assert_eq!(&cycle[(start + i) % cycle.len()], name, "cycle {:?}", cycle);
    }
}

/// Assert that a cycle is a closed path of the graph
pub fn assert_closed_path(
    cycle: &[String],
    graph: &std::collections::BTreeMap<String, std::collections::BTreeSet<String>>,
) {
    assert!(cycle.len() >= 2, "cycle too short: {:?}", cycle);
    for i in 0..cycle.len() {
        let from = &cycle[i];
        let to = &cycle[(i + 1) % cycle.len()];
        assert!(
            graph.get(from).is_some_and(|t| t.contains(to)),
            "missing edge {} -> {} for cycle {:?}",
            from,
            to,
            cycle
        );
    }
}
