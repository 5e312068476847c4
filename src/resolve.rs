//! Symbol resolution
//!
//! References arrive from the front-end as names written in source. Resolution
//! is two-stage: an exact lookup (front-end hint or fully-qualified match), then
//! a permissive name match against an index of every qualified and simple name
//! in the snapshot. Both stages sit behind [`SymbolResolver`] so the fallback
//! can be swapped.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::EntityModel;

/// Maps a written type name to a project entity
pub trait SymbolResolver: Send + Sync {
    /// Resolve `name` (with an optional front-end hint) to a qualified name
    /// present in the snapshot, or `None` when it names nothing in the project.
    fn resolve(&self, name: &str, hint: Option<&str>) -> Option<String>;
}

/// Stage one: the hint or the name itself must be a known qualified name
#[derive(Debug, Clone, Default)]
pub struct ExactResolver {
    known: BTreeSet<String>,
}

impl ExactResolver {
    pub fn new(model: &EntityModel) -> Self {
        Self {
            known: model.names().map(str::to_string).collect(),
        }
    }
}

impl SymbolResolver for ExactResolver {
    fn resolve(&self, name: &str, hint: Option<&str>) -> Option<String> {
        if let Some(hint) = hint {
            if self.known.contains(hint) {
                return Some(hint.to_string());
            }
        }
        if self.known.contains(name) {
            return Some(name.to_string());
        }
        None
    }
}

/// Stage two: name index over qualified names, simple names and
/// qualified suffixes (`Outer.Inner`)
///
/// Built in qualified-name order; the first entity registered for a key wins.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    by_name: BTreeMap<String, String>,
}

impl NameIndex {
    pub fn new(model: &EntityModel) -> Self {
        let mut by_name = BTreeMap::new();

        for qualified in model.names() {
            by_name
                .entry(qualified.to_string())
                .or_insert_with(|| qualified.to_string());
        }

        for entity in model.iter() {
            let qualified = entity.qualified_name.as_str();
            let local = qualified
                .strip_prefix(entity.package.as_str())
                .map(|s| s.trim_start_matches('.'))
                .unwrap_or(qualified);

            // Every dotted suffix of the package-local name: Outer.Inner, Inner
            let mut suffix = local;
            loop {
                by_name
                    .entry(suffix.to_string())
                    .or_insert_with(|| qualified.to_string());
                match suffix.find('.') {
                    Some(idx) => suffix = &suffix[idx + 1..],
                    None => break,
                }
            }
        }

        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl SymbolResolver for NameIndex {
    fn resolve(&self, name: &str, _hint: Option<&str>) -> Option<String> {
        self.by_name.get(name).cloned()
    }
}

/// Exact lookup followed by a swappable fallback
pub struct ProjectResolver {
    exact: ExactResolver,
    fallback: Box<dyn SymbolResolver>,
}

impl ProjectResolver {
    /// Resolver with the default [`NameIndex`] fallback
    pub fn new(model: &EntityModel) -> Self {
        Self::with_fallback(model, Box::new(NameIndex::new(model)))
    }

    pub fn with_fallback(model: &EntityModel, fallback: Box<dyn SymbolResolver>) -> Self {
        Self {
            exact: ExactResolver::new(model),
            fallback,
        }
    }
}

impl SymbolResolver for ProjectResolver {
    fn resolve(&self, name: &str, hint: Option<&str>) -> Option<String> {
        let name = extract_class_name(name);
        if name.is_empty() {
            return None;
        }
        self.exact
            .resolve(name, hint)
            .or_else(|| self.fallback.resolve(name, hint))
    }
}

/// Strip generic arguments, array brackets and varargs from a written type
///
/// `Map<String, List<Order>>` -> `Map`, `Order[]` -> `Order`, `Order...` -> `Order`
pub fn extract_class_name(type_name: &str) -> &str {
    let trimmed = type_name.trim();
    let end = trimmed
        .find(|c: char| c == '<' || c == '[')
        .unwrap_or(trimmed.len());
    trimmed[..end].trim_end_matches("...").trim()
}

/// Every class-like name mentioned in a written type, outermost first
///
/// `Map<String, List<Order>>` -> `[Map, String, List, Order]`. Primitives,
/// wildcards and bound keywords are dropped.
pub fn type_names(type_name: &str) -> Vec<&str> {
    type_name
        .split(|c: char| matches!(c, '<' | '>' | ',' | '[' | ']' | '&' | '?') || c.is_whitespace())
        .map(|s| s.trim_end_matches("..."))
        .filter(|s| !s.is_empty())
        .filter(|s| !matches!(*s, "extends" | "super" | "final"))
        .filter(|s| !is_primitive(s))
        .collect()
}

/// Java primitive and `void` types never resolve to an entity
pub fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "void" | "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double" | "var"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Entity, EntityKind};

    fn model() -> EntityModel {
        [
            Entity::new(EntityKind::Class, "com.acme", "Order", "Order.java"),
            Entity::new(EntityKind::Class, "com.other", "Order", "Order.java"),
            Entity::new(EntityKind::Class, "com.acme", "Outer.Inner", "Outer.java"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_extract_class_name() {
        assert_eq!(extract_class_name("List<Order>"), "List");
        assert_eq!(extract_class_name("Order[]"), "Order");
        assert_eq!(extract_class_name("Order..."), "Order");
        assert_eq!(extract_class_name("  Order  "), "Order");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(
            type_names("Map<String, List<Order>>"),
            vec!["Map", "String", "List", "Order"]
        );
        assert_eq!(type_names("List<? extends Shape>"), vec!["List", "Shape"]);
        assert!(type_names("int[]").is_empty());
    }

    #[test]
    fn test_exact_match_wins() {
        let resolver = ProjectResolver::new(&model());
        assert_eq!(
            resolver.resolve("com.other.Order", None),
            Some("com.other.Order".to_string())
        );
        assert_eq!(
            resolver.resolve("Order", Some("com.other.Order")),
            Some("com.other.Order".to_string())
        );
    }

    #[test]
    fn test_name_fallback_first_match() {
        let resolver = ProjectResolver::new(&model());
        // com.acme.Order sorts before com.other.Order
        assert_eq!(
            resolver.resolve("Order", None),
            Some("com.acme.Order".to_string())
        );
        assert_eq!(
            resolver.resolve("List<Order>", None),
            None,
            "List is not a project entity"
        );
    }

    #[test]
    fn test_nested_names() {
        let resolver = ProjectResolver::new(&model());
        assert_eq!(
            resolver.resolve("Inner", None),
            Some("com.acme.Outer.Inner".to_string())
        );
        assert_eq!(
            resolver.resolve("Outer.Inner", None),
            Some("com.acme.Outer.Inner".to_string())
        );
    }

    #[test]
    fn test_unknown_name() {
        let resolver = ProjectResolver::new(&model());
        assert_eq!(resolver.resolve("String", None), None);
        assert_eq!(resolver.resolve("", None), None);
    }
}
