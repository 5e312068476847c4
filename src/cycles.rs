//! Circular dependency detection
//!
//! Two strategies over the entity dependency map:
//! - [`CycleStrategy::Dfs`]: one DFS pass with a recursion stack. Nodes fully
//!   visited from an earlier root are not re-explored, so some cycles inside
//!   overlapping strongly connected components are missed.
//! - [`CycleStrategy::Complete`]: Tarjan SCC decomposition, then Johnson-style
//!   elementary cycle enumeration inside each component, bounded by
//!   `max_cycles`.
//!
//! Self-loops never appear in `cycles`; they are listed separately.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{CycleConfig, CycleStrategy};

/// Cycles found in one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Strategy that produced the cycles
    pub strategy: CycleStrategy,
    /// Closed paths of length >= 2; the edge from the last node back to the first is implied
    pub cycles: Vec<Vec<String>>,
    /// Entities depending on themselves
    pub self_loops: Vec<String>,
    /// The complete strategy found more cycles than `max_cycles`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl CycleReport {
    /// Cycles plus self-loops
    pub fn total(&self) -> usize {
        self.cycles.len() + self.self_loops.len()
    }
}

type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Detect cycles with the configured strategy
pub fn detect_cycles(graph: &Adjacency, config: &CycleConfig) -> CycleReport {
    let self_loops = find_self_loops(graph);
    let (cycles, truncated) = match config.strategy {
        CycleStrategy::Dfs => (detect_cycles_dfs(graph), false),
        CycleStrategy::Complete => enumerate_cycles(graph, config.max_cycles),
    };

    debug!(
        "Cycle detection ({}): {} cycles, {} self-loops",
        config.strategy.as_str(),
        cycles.len(),
        self_loops.len()
    );

    CycleReport {
        strategy: config.strategy,
        cycles,
        self_loops,
        truncated,
    }
}

fn find_self_loops(graph: &Adjacency) -> Vec<String> {
    graph
        .iter()
        .filter(|(node, targets)| targets.contains(*node))
        .map(|(node, _)| node.clone())
        .collect()
}

/// Detect cycles using DFS, roots and neighbors in name order
pub fn detect_cycles_dfs(graph: &Adjacency) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut rec_stack: HashSet<&str> = HashSet::new();
    let mut path: Vec<&str> = Vec::new();

    fn dfs<'a>(
        node: &'a str,
        graph: &'a Adjacency,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        if let Some(neighbors) = graph.get(node) {
            for neighbor in neighbors {
                let neighbor = neighbor.as_str();
                if neighbor == node {
                    continue;
                }
                if !visited.contains(neighbor) {
                    dfs(neighbor, graph, visited, rec_stack, path, cycles);
                } else if rec_stack.contains(neighbor) {
                    if let Some(start_idx) = path.iter().position(|x| *x == neighbor) {
                        let cycle: Vec<String> =
                            path[start_idx..].iter().map(|s| s.to_string()).collect();
                        if cycle.len() > 1 {
                            cycles.push(cycle);
                        }
                    }
                }
            }
        }

        path.pop();
        rec_stack.remove(node);
    }

    for node in graph.keys() {
        if !visited.contains(node.as_str()) {
            dfs(node, graph, &mut visited, &mut rec_stack, &mut path, &mut cycles);
        }
    }

    cycles
}

/// Enumerate elementary cycles of length >= 2, at most `max_cycles`
///
/// Returns the cycles and whether the bound cut the enumeration short, that
/// is, whether a further cycle exists beyond the first `max_cycles`. Each
/// cycle starts at its smallest node name.
pub fn enumerate_cycles(graph: &Adjacency, max_cycles: usize) -> (Vec<Vec<String>>, bool) {
    let mut pg: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for node in graph.keys() {
        index.insert(node.as_str(), pg.add_node(node.as_str()));
    }
    for (source, targets) in graph {
        for target in targets {
            if source == target {
                continue;
            }
            if let (Some(&from), Some(&to)) = (index.get(source.as_str()), index.get(target.as_str())) {
                pg.add_edge(from, to, ());
            }
        }
    }

    let mut components: Vec<Vec<&str>> = tarjan_scc(&pg)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut names: Vec<&str> = scc.iter().map(|&idx| pg[idx]).collect();
            names.sort_unstable();
            names
        })
        .collect();
    components.sort();

    let mut cycles = Vec::new();
    let mut truncated = false;
    for component in &components {
        if johnson_component(graph, component, max_cycles, &mut cycles) {
            truncated = true;
            break;
        }
    }

    if truncated {
        warn!("Cycle enumeration stopped at {} cycles", max_cycles);
    }

    (cycles, truncated)
}

/// Johnson's circuit search inside one strongly connected component
///
/// `nodes` is sorted; cycles through node `i` only use nodes ranked `>= i`,
/// so every elementary cycle is emitted exactly once, rotated to its smallest
/// node. Returns true when a cycle beyond `max_cycles` was found.
fn johnson_component(
    graph: &Adjacency,
    nodes: &[&str],
    max_cycles: usize,
    cycles: &mut Vec<Vec<String>>,
) -> bool {
    let rank: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let adjacency: Vec<Vec<usize>> = nodes
        .iter()
        .map(|node| {
            graph
                .get(*node)
                .map(|targets| {
                    targets
                        .iter()
                        .filter_map(|t| rank.get(t.as_str()).copied())
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    struct Search<'a> {
        adjacency: &'a [Vec<usize>],
        nodes: &'a [&'a str],
        start: usize,
        blocked: Vec<bool>,
        blocked_by: Vec<BTreeSet<usize>>,
        stack: Vec<usize>,
        max_cycles: usize,
        truncated: bool,
    }

    impl Search<'_> {
        fn unblock(&mut self, node: usize) {
            self.blocked[node] = false;
            let waiting = std::mem::take(&mut self.blocked_by[node]);
            for w in waiting {
                if self.blocked[w] {
                    self.unblock(w);
                }
            }
        }

        fn circuit(&mut self, v: usize, cycles: &mut Vec<Vec<String>>) -> bool {
            let mut found = false;
            self.stack.push(v);
            self.blocked[v] = true;

            for i in 0..self.adjacency[v].len() {
                let w = self.adjacency[v][i];
                if w < self.start || w == v {
                    continue;
                }
                if w == self.start {
                    if cycles.len() >= self.max_cycles {
                        self.truncated = true;
                    } else {
                        cycles.push(self.stack.iter().map(|&n| self.nodes[n].to_string()).collect());
                        found = true;
                    }
                } else if !self.blocked[w] && self.circuit(w, cycles) {
                    found = true;
                }
                if self.truncated {
                    break;
                }
            }

            if found {
                self.unblock(v);
            } else {
                for i in 0..self.adjacency[v].len() {
                    let w = self.adjacency[v][i];
                    if w >= self.start && w != v {
                        self.blocked_by[w].insert(v);
                    }
                }
            }

            self.stack.pop();
            found
        }
    }

    for start in 0..nodes.len() {
        let mut search = Search {
            adjacency: &adjacency,
            nodes,
            start,
            blocked: vec![false; nodes.len()],
            blocked_by: vec![BTreeSet::new(); nodes.len()],
            stack: Vec::new(),
            max_cycles,
            truncated: false,
        };
        search.circuit(start, cycles);
        if search.truncated {
            return true;
        }
    }

    false
}

/// Topological order by reverse DFS post-order, roots and neighbors in name order
///
/// Defined for cyclic graphs too; members of a cycle then appear in DFS order.
pub fn topological_order(graph: &Adjacency) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut order: Vec<String> = Vec::with_capacity(graph.len());

    fn visit<'a>(node: &'a str, graph: &'a Adjacency, visited: &mut HashSet<&'a str>, order: &mut Vec<String>) {
        if !visited.insert(node) {
            return;
        }
        if let Some(neighbors) = graph.get(node) {
            for neighbor in neighbors {
                visit(neighbor, graph, visited, order);
            }
        }
        order.push(node.to_string());
    }

    for node in graph.keys() {
        visit(node, graph, &mut visited, &mut order);
    }

    order.reverse();
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> Adjacency {
        edges
            .iter()
            .map(|(s, ts)| (s.to_string(), ts.iter().map(|t| t.to_string()).collect()))
            .collect()
    }

    fn rotate_to_min(cycle: &[String]) -> Vec<String> {
        let min = cycle
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        cycle[min..].iter().chain(cycle[..min].iter()).cloned().collect()
    }

    #[test]
    fn test_cycle_detection() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let cycles = detect_cycles_dfs(&g);
        assert_eq!(cycles.len(), 1);
        assert_eq!(rotate_to_min(&cycles[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_self_loops_reported_separately() {
        let g = graph(&[("a", &["a", "b"]), ("b", &[])]);
        let report = detect_cycles(&g, &CycleConfig::default());
        assert!(report.cycles.is_empty());
        assert_eq!(report.self_loops, vec!["a"]);
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn test_acyclic_graph() {
        let g = graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        assert!(detect_cycles_dfs(&g).is_empty());
        let (cycles, truncated) = enumerate_cycles(&g, 10);
        assert!(cycles.is_empty());
        assert!(!truncated);
    }

    #[test]
    fn test_complete_finds_overlapping_cycles() {
        // a->b->a and a->c->b->a share a and b
        let g = graph(&[("a", &["b", "c"]), ("b", &["a"]), ("c", &["b"])]);
        let (cycles, truncated) = enumerate_cycles(&g, 100);
        assert!(!truncated);

        let found: BTreeSet<Vec<String>> = cycles.iter().map(|c| rotate_to_min(c)).collect();
        let expected: BTreeSet<Vec<String>> = [
            vec!["a".to_string(), "b".to_string()],
            vec!["a".to_string(), "c".to_string(), "b".to_string()],
        ]
        .into_iter()
        .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_complete_respects_bound() {
        // Complete graph on four nodes has 20 elementary cycles
        let names = ["a", "b", "c", "d"];
        let mut g = Adjacency::new();
        for n in names {
            g.insert(
                n.to_string(),
                names.iter().filter(|m| **m != n).map(|m| m.to_string()).collect(),
            );
        }
        let (all, truncated) = enumerate_cycles(&g, 1000);
        assert_eq!(all.len(), 20);
        assert!(!truncated);

        let (bounded, truncated) = enumerate_cycles(&g, 5);
        assert_eq!(bounded.len(), 5);
        assert!(truncated);

        let (exact, truncated) = enumerate_cycles(&g, 20);
        assert_eq!(exact.len(), 20);
        assert!(!truncated);
    }

    #[test]
    fn test_bound_equal_to_cycle_count() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);
        let (cycles, truncated) = enumerate_cycles(&g, 1);
        assert_eq!(cycles, vec![vec!["a".to_string(), "b".to_string()]]);
        assert!(!truncated);

        let (cycles, truncated) = enumerate_cycles(&g, 0);
        assert!(cycles.is_empty());
        assert!(truncated);
    }

    #[test]
    fn test_bound_spanning_components() {
        let g = graph(&[("a", &["b"]), ("b", &["a"]), ("x", &["y"]), ("y", &["x"])]);
        let (cycles, truncated) = enumerate_cycles(&g, 1);
        assert_eq!(cycles.len(), 1);
        assert!(truncated);

        let (cycles, truncated) = enumerate_cycles(&g, 2);
        assert_eq!(cycles.len(), 2);
        assert!(!truncated);
    }

    #[test]
    fn test_topological_order() {
        let g = graph(&[("app", &["service"]), ("service", &["repo"]), ("repo", &[])]);
        assert_eq!(topological_order(&g), vec!["app", "service", "repo"]);
    }
}
