//! Structural code-pattern search
//!
//! A [`CodePattern`] matches entities, methods, or both. The built-in set
//! covers singletons, factories, accessors and test classes; callers can add
//! their own through [`crate::Analyzer::with_patterns`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detectors::common::last_segment;
use crate::error::{EngineError, Result};
use crate::resolve::extract_class_name;
use crate::schema::{Entity, EntityKind, EntityModel, Member, MemberKind, Visibility};

/// A named structural pattern
pub trait CodePattern: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Entity-level match
    fn matches_entity(&self, _entity: &Entity) -> bool {
        false
    }

    /// Method-level match; `owner` declares `method`
    fn matches_method(&self, _owner: &Entity, _method: &Member) -> bool {
        false
    }
}

/// Private constructor plus a static field of the class's own type
pub struct SingletonPattern;

impl CodePattern for SingletonPattern {
    fn name(&self) -> &str {
        "Singleton"
    }

    fn description(&self) -> &str {
        "Classes implementing the singleton pattern"
    }

    fn matches_entity(&self, entity: &Entity) -> bool {
        let private_ctor = entity
            .members
            .iter()
            .any(|m| m.kind == MemberKind::Constructor && m.visibility == Visibility::Private);
        let own_type = last_segment(&entity.name);
        let static_instance = entity.fields().any(|f| {
            f.is_static
                && f.type_name
                    .as_deref()
                    .is_some_and(|t| last_segment(extract_class_name(t)) == own_type)
        });
        private_ctor && static_instance
    }
}

/// Classes with a static `create*` method
pub struct FactoryPattern;

impl CodePattern for FactoryPattern {
    fn name(&self) -> &str {
        "Factory"
    }

    fn description(&self) -> &str {
        "Classes exposing static create methods"
    }

    fn matches_entity(&self, entity: &Entity) -> bool {
        entity
            .methods()
            .any(|m| m.is_static && m.name.starts_with("create"))
    }
}

/// `get*`/`set*`/`is*` methods with at most one parameter
pub struct GetterSetterPattern;

impl CodePattern for GetterSetterPattern {
    fn name(&self) -> &str {
        "GetterSetter"
    }

    fn description(&self) -> &str {
        "Getter and setter methods"
    }

    fn matches_method(&self, _owner: &Entity, method: &Member) -> bool {
        let name = method.name.as_str();
        (name.starts_with("get") || name.starts_with("set") || name.starts_with("is"))
            && method.parameters.len() <= 1
    }
}

/// Test classes by name or annotation, test methods by `@Test`
pub struct TestClassPattern;

impl CodePattern for TestClassPattern {
    fn name(&self) -> &str {
        "TestClass"
    }

    fn description(&self) -> &str {
        "Test classes"
    }

    fn matches_entity(&self, entity: &Entity) -> bool {
        entity.name.ends_with("Test")
            || entity.name.ends_with("Tests")
            || entity.annotations.iter().any(|a| a.contains("Test"))
    }

    fn matches_method(&self, _owner: &Entity, method: &Member) -> bool {
        method.annotations.iter().any(|a| a == "Test")
    }
}

/// Every built-in pattern, in report order
pub fn builtin_patterns() -> Vec<Box<dyn CodePattern>> {
    vec![
        Box::new(SingletonPattern),
        Box::new(FactoryPattern),
        Box::new(GetterSetterPattern),
        Box::new(TestClassPattern),
    ]
}

/// Built-in patterns selected by name, case-insensitive, in built-in order
pub fn patterns_by_name(names: &[String]) -> Result<Vec<Box<dyn CodePattern>>> {
    let known: Vec<String> = builtin_patterns().iter().map(|p| p.name().to_string()).collect();
    if let Some(unknown) = names
        .iter()
        .find(|n| !known.iter().any(|k| k.eq_ignore_ascii_case(n)))
    {
        return Err(EngineError::Config {
            message: format!("unknown pattern '{}' (expected one of {})", unknown, known.join(", ")),
        });
    }

    Ok(builtin_patterns()
        .into_iter()
        .filter(|p| names.iter().any(|n| p.name().eq_ignore_ascii_case(n)))
        .collect())
}

/// What kind of element matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Class,
    Interface,
    Enum,
    Record,
    Method,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Record => "record",
            Self::Method => "method",
        }
    }

    fn of(entity: &Entity) -> Self {
        match entity.kind {
            EntityKind::Class => Self::Class,
            EntityKind::Interface => Self::Interface,
            EntityKind::Enum => Self::Enum,
            EntityKind::Record => Self::Record,
        }
    }
}

/// One element matching one pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: String,
    /// Qualified entity name, or `Owner.method` for methods
    pub element: String,
    pub simple_name: String,
    pub kind: ElementKind,
    pub file_path: String,
}

/// Matches per pattern name; every searched pattern has an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSearchResult {
    pub matches: BTreeMap<String, Vec<PatternMatch>>,
}

impl PatternSearchResult {
    pub fn total_matches(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }

    pub fn matches_for(&self, pattern: &str) -> &[PatternMatch] {
        self.matches.get(pattern).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Run every pattern over every entity and its methods, in model order
pub fn find_patterns(model: &EntityModel, patterns: &[Box<dyn CodePattern>]) -> PatternSearchResult {
    let mut result = PatternSearchResult::default();

    for pattern in patterns {
        let mut found = Vec::new();
        for entity in model.iter() {
            if pattern.matches_entity(entity) {
                found.push(PatternMatch {
                    pattern: pattern.name().to_string(),
                    element: entity.qualified_name.clone(),
                    simple_name: entity.name.clone(),
                    kind: ElementKind::of(entity),
                    file_path: entity.file_path.clone(),
                });
            }
            for method in entity.methods() {
                if pattern.matches_method(entity, method) {
                    found.push(PatternMatch {
                        pattern: pattern.name().to_string(),
                        element: format!("{}.{}", entity.qualified_name, method.name),
                        simple_name: method.name.clone(),
                        kind: ElementKind::Method,
                        file_path: entity.file_path.clone(),
                    });
                }
            }
        }
        result.matches.insert(pattern.name().to_string(), found);
    }

    result
}
