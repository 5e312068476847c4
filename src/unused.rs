//! Unused code detection
//!
//! An entity is unused when no dependency set names it and it is not an entry
//! point. A method is unused when no resolved call site targets it and it is
//! not an entry-point method. Entry points come from an [`EntryPointPolicy`].

use std::collections::{BTreeMap, BTreeSet};

use crate::config::EntryPointConfig;
use crate::schema::{Entity, EntityModel, Member};

/// Decides which code is reachable from outside the analyzed sources
pub trait EntryPointPolicy: Send + Sync {
    /// Entity invoked by a runtime, framework or test harness
    fn is_entry_point(&self, entity: &Entity) -> bool;

    /// Method invoked by a runtime, framework or test harness
    fn is_entry_point_method(&self, entity: &Entity, method: &Member) -> bool;
}

/// Main methods, test naming conventions and framework annotations
#[derive(Debug, Clone, Default)]
pub struct DefaultEntryPoints {
    config: EntryPointConfig,
}

impl DefaultEntryPoints {
    pub fn new(config: EntryPointConfig) -> Self {
        Self { config }
    }

    fn is_test_name(&self, name: &str) -> bool {
        self.config.test_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

impl EntryPointPolicy for DefaultEntryPoints {
    fn is_entry_point(&self, entity: &Entity) -> bool {
        if entity.has_main_method() || self.is_test_name(&entity.name) {
            return true;
        }

        let marker = self.config.test_path_marker.as_str();
        if !marker.is_empty() && entity.file_path.replace('\\', "/").contains(marker) {
            return true;
        }

        self.config
            .annotations
            .iter()
            .any(|a| entity.has_annotation(a))
    }

    fn is_entry_point_method(&self, entity: &Entity, method: &Member) -> bool {
        if method.name == "main" || method.name.contains("Test") || method.name.starts_with("test") {
            return true;
        }
        if self.is_test_name(&entity.name) {
            return true;
        }
        self.config
            .method_annotations
            .iter()
            .any(|a| method.has_annotation(a))
    }
}

/// Entities nothing depends on, minus entry points, in name order
pub fn find_unused_classes(
    model: &EntityModel,
    class_dependencies: &BTreeMap<String, BTreeSet<String>>,
    policy: &dyn EntryPointPolicy,
) -> Vec<String> {
    let referenced: BTreeSet<&str> = class_dependencies
        .values()
        .flat_map(|targets| targets.iter().map(String::as_str))
        .collect();

    model
        .iter()
        .filter(|entity| !referenced.contains(entity.qualified_name.as_str()))
        .filter(|entity| !policy.is_entry_point(entity))
        .map(|entity| entity.qualified_name.clone())
        .collect()
}

/// `Owner.method` ids with no recorded call, minus entry-point methods
///
/// Overloads share one id; any call to the name marks all of them used.
pub fn find_unused_methods(
    model: &EntityModel,
    call_counts: &BTreeMap<String, usize>,
    policy: &dyn EntryPointPolicy,
) -> Vec<String> {
    let mut unused = BTreeSet::new();

    for entity in model.iter() {
        for method in entity.methods() {
            let key = entity.member_key(method);
            if call_counts.get(&key).copied().unwrap_or(0) > 0 {
                continue;
            }
            if policy.is_entry_point_method(entity, method) {
                continue;
            }
            unused.insert(key);
        }
    }

    // An overload marked as an entry point keeps the shared id alive
    for entity in model.iter() {
        for method in entity.methods() {
            if policy.is_entry_point_method(entity, method) {
                unused.remove(&entity.member_key(method));
            }
        }
    }

    unused.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityKind, Visibility};

    fn class(name: &str) -> Entity {
        Entity::new(EntityKind::Class, "app", name, &format!("src/main/java/app/{}.java", name))
    }

    fn main_method() -> Member {
        Member::method("main", "void")
            .with_visibility(Visibility::Public)
            .with_static(true)
            .with_parameter("args", "String[]")
    }

    #[test]
    fn test_entry_point_rules() {
        let policy = DefaultEntryPoints::default();

        assert!(policy.is_entry_point(&class("App").with_member(main_method())));
        assert!(policy.is_entry_point(&class("OrderServiceTest")));
        assert!(policy.is_entry_point(&class("OrderTests")));
        assert!(policy.is_entry_point(&class("OrderService").with_annotation("Service")));
        assert!(policy.is_entry_point(&Entity::new(
            EntityKind::Class,
            "app",
            "Fixture",
            "src/test/java/app/Fixture.java"
        )));
        assert!(!policy.is_entry_point(&class("Helper")));
    }

    #[test]
    fn test_unused_classes() {
        let model: EntityModel = [
            class("App").with_member(main_method()),
            class("Used"),
            class("Orphan"),
            class("Selfish"),
        ]
        .into_iter()
        .collect();

        let mut deps: BTreeMap<String, BTreeSet<String>> =
            model.names().map(|n| (n.to_string(), BTreeSet::new())).collect();
        deps.get_mut("app.App").unwrap().insert("app.Used".to_string());
        deps.get_mut("app.Selfish").unwrap().insert("app.Selfish".to_string());

        let unused = find_unused_classes(&model, &deps, &DefaultEntryPoints::default());
        assert_eq!(unused, vec!["app.Orphan"]);
    }

    #[test]
    fn test_unused_methods() {
        let model: EntityModel = [class("Service")
            .with_member(Member::method("run", "void"))
            .with_member(Member::method("helper", "void"))
            .with_member(Member::method("init", "void").with_annotation("PostConstruct"))
            .with_member(Member::method("toString", "String").with_annotation("Override"))]
        .into_iter()
        .collect();

        let mut calls = BTreeMap::new();
        calls.insert("app.Service.helper".to_string(), 2);

        let unused = find_unused_methods(&model, &calls, &DefaultEntryPoints::default());
        assert_eq!(unused, vec!["app.Service.run"]);
    }
}
