//! Dependency graph construction
//!
//! Each entity is folded independently into an [`EntityDependencies`] record
//! (in parallel), then the records are merged into one [`DependencyGraph`].
//! Edges only ever point at entities in the snapshot; references that resolve
//! to nothing are dropped and counted in [`GraphDiagnostics`].

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolve::{type_names, ProjectResolver, SymbolResolver};
use crate::schema::{package_of, Entity, EntityModel, Reference, ReferenceKind, SkippedFile, UNRESOLVED_PREFIX};

/// How one entity uses another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Inherits,
    Implements,
    Calls,
    ReferencesField,
    Instantiates,
    /// Field, return or parameter type, or a local type use
    ReferencesType,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inherits => "inherits",
            Self::Implements => "implements",
            Self::Calls => "calls",
            Self::ReferencesField => "references-field",
            Self::Instantiates => "instantiates",
            Self::ReferencesType => "references-type",
        }
    }
}

/// A typed edge between two entities of the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// Counters for everything the builder could not place in the graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDiagnostics {
    /// Method calls kept under the `UNRESOLVED` bucket
    pub unresolved_calls: usize,
    /// Other references that resolved to no project entity
    pub dropped_references: usize,
    /// Files the front-end skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<SkippedFile>,
}

/// Dependencies of a single entity, computed without shared state
#[derive(Debug, Clone, Default)]
pub struct EntityDependencies {
    pub entity: String,
    /// Project entities this one depends on
    pub depends_on: BTreeSet<String>,
    /// `Target.method` strings, `UNRESOLVED.method` when the target is unknown
    pub method_calls: BTreeSet<String>,
    /// `Target.field` strings, `UNRESOLVED.field` when the target is unknown
    pub field_references: BTreeSet<String>,
    /// Distinct typed edges
    pub edges: BTreeSet<DependencyEdge>,
    /// One entry per resolved call site, including `Target.<init>` for instantiations
    pub call_sites: Vec<String>,
    /// One entry per resolved call, instantiation or field access on another entity
    pub usages: Vec<String>,
    pub unresolved_calls: usize,
    pub dropped_references: usize,
}

impl EntityDependencies {
    fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            ..Default::default()
        }
    }

    fn add_edge(&mut self, target: String, kind: EdgeKind) {
        self.depends_on.insert(target.clone());
        self.edges.insert(DependencyEdge {
            source: self.entity.clone(),
            target,
            kind,
        });
    }

    fn add_usage(&mut self, target: &str) {
        if target != self.entity {
            self.usages.push(target.to_string());
        }
    }
}

/// Fold one entity against the resolver
pub fn fold_entity(entity: &Entity, resolver: &dyn SymbolResolver) -> EntityDependencies {
    let mut deps = EntityDependencies::new(&entity.qualified_name);

    for name in &entity.extends {
        match resolver.resolve(name, None) {
            Some(target) => deps.add_edge(target, EdgeKind::Inherits),
            None => deps.dropped_references += 1,
        }
    }

    for name in &entity.implements {
        match resolver.resolve(name, None) {
            Some(target) => deps.add_edge(target, EdgeKind::Implements),
            None => deps.dropped_references += 1,
        }
    }

    for member in &entity.members {
        let declared = member
            .type_name
            .iter()
            .chain(member.parameters.iter().map(|p| &p.type_name));
        for written in declared {
            for name in type_names(written) {
                match resolver.resolve(name, None) {
                    Some(target) => deps.add_edge(target, EdgeKind::ReferencesType),
                    None => deps.dropped_references += 1,
                }
            }
        }

        for reference in &member.references {
            fold_reference(&mut deps, reference, resolver);
        }
    }

    for reference in &entity.references {
        fold_reference(&mut deps, reference, resolver);
    }

    deps
}

fn fold_reference(deps: &mut EntityDependencies, reference: &Reference, resolver: &dyn SymbolResolver) {
    let target = reference
        .target
        .as_deref()
        .and_then(|t| resolver.resolve(t, reference.resolved.as_deref()));
    let member = reference.member.as_deref().unwrap_or_default();

    match reference.kind {
        ReferenceKind::MethodCall => match target {
            Some(target) => {
                let call = format!("{}.{}", target, member);
                deps.method_calls.insert(call.clone());
                deps.call_sites.push(call);
                deps.add_usage(&target);
                deps.add_edge(target, EdgeKind::Calls);
            }
            None => {
                deps.method_calls
                    .insert(format!("{}.{}", UNRESOLVED_PREFIX, member));
                deps.unresolved_calls += 1;
            }
        },
        ReferenceKind::Instantiation => match target {
            Some(target) => {
                deps.call_sites.push(format!("{}.<init>", target));
                deps.add_usage(&target);
                deps.add_edge(target, EdgeKind::Instantiates);
            }
            None => deps.dropped_references += 1,
        },
        ReferenceKind::FieldAccess => match target {
            Some(target) => {
                deps.field_references
                    .insert(format!("{}.{}", target, member));
                deps.add_usage(&target);
                deps.add_edge(target, EdgeKind::ReferencesField);
            }
            None => {
                deps.field_references
                    .insert(format!("{}.{}", UNRESOLVED_PREFIX, member));
                deps.dropped_references += 1;
            }
        },
        ReferenceKind::TypeUse => match target {
            Some(target) => deps.add_edge(target, EdgeKind::ReferencesType),
            None => deps.dropped_references += 1,
        },
    }
}

/// The merged dependency graph of one snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Entity -> project-local entities it depends on (every entity has a key)
    pub class_dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Entity -> `Target.method` strings
    pub method_calls: BTreeMap<String, BTreeSet<String>>,
    /// Entity -> `Target.field` strings
    pub field_references: BTreeMap<String, BTreeSet<String>>,
    /// Package -> packages it depends on, same-package edges dropped
    pub package_dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Every distinct typed edge, sorted
    pub edges: Vec<DependencyEdge>,
    /// `Target.method` -> number of resolved call sites
    pub call_counts: BTreeMap<String, usize>,
    /// `Target.method` -> entities calling it
    pub callers: BTreeMap<String, BTreeSet<String>>,
    /// Entity -> references from other entities (calls, instantiations, field accesses)
    pub usage_counts: BTreeMap<String, usize>,
    pub diagnostics: GraphDiagnostics,
}

impl DependencyGraph {
    /// Build with the default two-stage resolver
    pub fn build(model: &EntityModel) -> Self {
        let resolver = ProjectResolver::new(model);
        Self::build_with(model, &resolver)
    }

    /// Build with a caller-supplied resolver
    pub fn build_with(model: &EntityModel, resolver: &dyn SymbolResolver) -> Self {
        let entities: Vec<&Entity> = model.iter().collect();
        let folds: Vec<EntityDependencies> = entities
            .par_iter()
            .map(|entity| fold_entity(entity, resolver))
            .collect();

        let graph = Self::merge(model, folds);
        debug!(
            "Built dependency graph: {} entities, {} edges, {} unresolved calls",
            graph.class_dependencies.len(),
            graph.edges.len(),
            graph.diagnostics.unresolved_calls
        );
        graph
    }

    /// Merge per-entity folds; the single synchronization point of a build
    pub fn merge(model: &EntityModel, folds: Vec<EntityDependencies>) -> Self {
        let mut graph = Self::default();
        for name in model.names() {
            graph.class_dependencies.insert(name.to_string(), BTreeSet::new());
            graph.usage_counts.insert(name.to_string(), 0);
        }

        let mut edges = BTreeSet::new();
        for fold in folds {
            for call in &fold.call_sites {
                *graph.call_counts.entry(call.clone()).or_insert(0) += 1;
                graph
                    .callers
                    .entry(call.clone())
                    .or_default()
                    .insert(fold.entity.clone());
            }
            for target in &fold.usages {
                *graph.usage_counts.entry(target.clone()).or_insert(0) += 1;
            }

            if let Some(entity) = model.get(&fold.entity) {
                let source_package = entity.package.as_str();
                for target in &fold.depends_on {
                    let target_package = model
                        .get(target)
                        .map(|e| e.package.as_str())
                        .unwrap_or_else(|| package_of(target));
                    if source_package != target_package {
                        graph
                            .package_dependencies
                            .entry(source_package.to_string())
                            .or_default()
                            .insert(target_package.to_string());
                    }
                }
            }

            graph.diagnostics.unresolved_calls += fold.unresolved_calls;
            graph.diagnostics.dropped_references += fold.dropped_references;
            edges.extend(fold.edges);

            if !fold.method_calls.is_empty() {
                graph.method_calls.insert(fold.entity.clone(), fold.method_calls);
            }
            if !fold.field_references.is_empty() {
                graph
                    .field_references
                    .insert(fold.entity.clone(), fold.field_references);
            }
            graph.class_dependencies.insert(fold.entity, fold.depends_on);
        }

        graph.edges = edges.into_iter().collect();
        graph
    }

    /// Attach front-end skip diagnostics
    pub fn with_skipped_files(mut self, skipped: Vec<SkippedFile>) -> Self {
        self.diagnostics.skipped_files = skipped;
        self
    }

    pub fn node_count(&self) -> usize {
        self.class_dependencies.len()
    }

    /// Number of distinct (source, target) pairs
    pub fn edge_count(&self) -> usize {
        self.class_dependencies.values().map(BTreeSet::len).sum()
    }

    /// Entities some other entity (or itself) depends on
    pub fn referenced_entities(&self) -> BTreeSet<&str> {
        self.class_dependencies
            .values()
            .flat_map(|targets| targets.iter().map(String::as_str))
            .collect()
    }

    /// Entities that depend on `name`
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.class_dependencies
            .iter()
            .filter(|(_, targets)| targets.contains(name))
            .map(|(source, _)| source.as_str())
            .collect()
    }
}
