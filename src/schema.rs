//! Entity model data structures
//!
//! The structural facts a front-end records about a project: entities
//! (classes, interfaces, enums, records), their members, and the raw references
//! found in member bodies. Entities are built once per parse pass and only read
//! afterwards; every analysis phase borrows them from the [`EntityModel`].

use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Schema version of serialized results and cache entries
pub const SCHEMA_VERSION: &str = "1.1";

/// Marker used for call and field-access targets whose declaring type is unknown
pub const UNRESOLVED_PREFIX: &str = "UNRESOLVED";

/// Kind of entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Class definition
    #[default]
    Class,
    /// Interface definition
    Interface,
    /// Enum definition
    Enum,
    /// Record definition
    Record,
}

impl EntityKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Record => "record",
        }
    }
}

/// Declared visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    #[default]
    Package,
}

impl Visibility {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Package => "package",
        }
    }
}

/// Kind of member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
}

/// Kind of raw reference found in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `scope.method(...)` or bare `method(...)`
    MethodCall,
    /// `new Type(...)`
    Instantiation,
    /// `scope.field`
    FieldAccess,
    /// A type named in a declaration (local variable, cast, generic argument)
    TypeUse,
}

/// A reference as the front-end saw it, possibly unresolved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Reference {
    /// What kind of expression produced this reference
    pub kind: ReferenceKind,

    /// Target type as written (call scope, created type, accessed object).
    /// `None` when the scope could not be turned into a type name at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Member name for calls and field accesses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,

    /// Fully-qualified name the front-end already resolved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
}

impl Default for ReferenceKind {
    fn default() -> Self {
        Self::TypeUse
    }
}

impl Reference {
    /// Method call on a (possibly unknown) target type
    pub fn call(target: Option<&str>, member: &str) -> Self {
        Self {
            kind: ReferenceKind::MethodCall,
            target: target.map(str::to_string),
            member: Some(member.to_string()),
            resolved: None,
        }
    }

    /// Object creation of the given type
    pub fn instantiation(target: &str) -> Self {
        Self {
            kind: ReferenceKind::Instantiation,
            target: Some(target.to_string()),
            member: None,
            resolved: None,
        }
    }

    /// Field access on a (possibly unknown) target type
    pub fn field_access(target: Option<&str>, member: &str) -> Self {
        Self {
            kind: ReferenceKind::FieldAccess,
            target: target.map(str::to_string),
            member: Some(member.to_string()),
            resolved: None,
        }
    }

    /// Plain use of a type name
    pub fn type_use(target: &str) -> Self {
        Self {
            kind: ReferenceKind::TypeUse,
            target: Some(target.to_string()),
            member: None,
            resolved: None,
        }
    }

    /// Attach a resolution hint from the front-end
    pub fn resolved_as(mut self, qualified_name: &str) -> Self {
        self.resolved = Some(qualified_name.to_string());
        self
    }
}

/// Method or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

/// Field, method or constructor declared by an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Member kind
    pub kind: MemberKind,

    /// Member name (`<init>` for constructors)
    pub name: String,

    /// Field type or method return type; `None` for constructors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Parameters (methods and constructors only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    /// Declared visibility
    pub visibility: Visibility,

    pub is_static: bool,
    pub is_abstract: bool,

    /// Annotation names without the `@`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,

    /// Normalized body (whitespace collapsed, comments stripped)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Cyclomatic complexity, at least 1 for methods and constructors
    pub complexity: usize,

    /// Source lines spanned by the declaration
    pub line_count: usize,

    /// Raw references found in the body
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    /// Names of the owner's fields this member reads or writes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessed_fields: Vec<String>,
}

impl Member {
    fn base(kind: MemberKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            type_name: None,
            parameters: Vec::new(),
            visibility: Visibility::default(),
            is_static: false,
            is_abstract: false,
            annotations: Vec::new(),
            body: None,
            complexity: if kind == MemberKind::Field { 0 } else { 1 },
            line_count: 0,
            references: Vec::new(),
            accessed_fields: Vec::new(),
        }
    }

    /// New field of the given type
    pub fn field(name: &str, type_name: &str) -> Self {
        let mut member = Self::base(MemberKind::Field, name);
        member.type_name = Some(type_name.to_string());
        member
    }

    /// New method with the given return type
    pub fn method(name: &str, return_type: &str) -> Self {
        let mut member = Self::base(MemberKind::Method, name);
        member.type_name = Some(return_type.to_string());
        member
    }

    /// New constructor
    pub fn constructor() -> Self {
        Self::base(MemberKind::Constructor, "<init>")
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_parameter(mut self, name: &str, type_name: &str) -> Self {
        self.parameters.push(Parameter {
            name: name.to_string(),
            type_name: type_name.to_string(),
        });
        self
    }

    pub fn with_annotation(mut self, annotation: &str) -> Self {
        self.annotations.push(annotation.to_string());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_complexity(mut self, complexity: usize) -> Self {
        self.complexity = complexity.max(1);
        self
    }

    pub fn with_line_count(mut self, line_count: usize) -> Self {
        self.line_count = line_count;
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_accessed_field(mut self, field: &str) -> Self {
        self.accessed_fields.push(field.to_string());
        self
    }

    /// Whether this is a method or constructor
    pub fn is_callable(&self) -> bool {
        self.kind != MemberKind::Field
    }

    /// Parameter type list, e.g. `(String,int)`
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.parameters.iter().map(|p| p.type_name.as_str()).collect();
        format!("({})", types.join(","))
    }

    /// `public static main(...)`
    pub fn is_main(&self) -> bool {
        self.kind == MemberKind::Method
            && self.name == "main"
            && self.is_static
            && self.visibility == Visibility::Public
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

/// A named, uniquely addressable code unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Fully-qualified name, unique within a snapshot
    pub qualified_name: String,

    /// Simple name
    pub name: String,

    /// Declaring package ("" for the default package)
    pub package: String,

    /// Declaring file
    pub file_path: String,

    pub kind: EntityKind,
    pub is_abstract: bool,
    pub is_static: bool,

    /// Annotation names without the `@`
    #[serde(default)]
    pub annotations: Vec<String>,

    /// Superclass names as written
    #[serde(default)]
    pub extends: Vec<String>,

    /// Implemented (or, for interfaces, extended) interface names as written
    #[serde(default)]
    pub implements: Vec<String>,

    /// Declared fields, methods and constructors
    #[serde(default)]
    pub members: Vec<Member>,

    /// References found outside members (initializer blocks, enum constants)
    #[serde(default)]
    pub references: Vec<Reference>,

    /// First and last source line of the declaration (1-indexed)
    pub start_line: usize,
    pub end_line: usize,
}

impl Entity {
    /// New entity; `qualified_name` is derived from package and name
    pub fn new(kind: EntityKind, package: &str, name: &str, file_path: &str) -> Self {
        Self {
            qualified_name: qualify(package, name),
            name: name.to_string(),
            package: package.to_string(),
            file_path: file_path.to_string(),
            kind,
            is_abstract: false,
            is_static: false,
            annotations: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            members: Vec::new(),
            references: Vec::new(),
            start_line: 0,
            end_line: 0,
        }
    }

    pub fn with_extends(mut self, name: &str) -> Self {
        self.extends.push(name.to_string());
        self
    }

    pub fn with_implements(mut self, name: &str) -> Self {
        self.implements.push(name.to_string());
        self
    }

    pub fn with_annotation(mut self, name: &str) -> Self {
        self.annotations.push(name.to_string());
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.start_line = start;
        self.end_line = end;
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Field)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Method)
    }

    /// Methods and constructors
    pub fn callables(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_callable())
    }

    pub fn has_main_method(&self) -> bool {
        self.members.iter().any(Member::is_main)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    /// Identifier of a member including its signature, e.g. `a.B.run(int)`
    pub fn member_id(&self, member: &Member) -> String {
        format!("{}.{}{}", self.qualified_name, member.name, member.signature())
    }

    /// Identifier of a member without signature, e.g. `a.B.run`
    pub fn member_key(&self, member: &Member) -> String {
        format!("{}.{}", self.qualified_name, member.name)
    }

    /// Lines spanned by the declaration
    pub fn line_span(&self) -> usize {
        if self.end_line >= self.start_line && self.end_line > 0 {
            self.end_line - self.start_line + 1
        } else {
            0
        }
    }
}

/// Join a package and a simple name
pub fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

/// Package part of a fully-qualified name ("" when unqualified)
pub fn package_of(qualified_name: &str) -> &str {
    match qualified_name.rfind('.') {
        Some(idx) if idx > 0 => &qualified_name[..idx],
        _ => "",
    }
}

/// Simple-name part of a fully-qualified name
pub fn simple_name_of(qualified_name: &str) -> &str {
    match qualified_name.rfind('.') {
        Some(idx) => &qualified_name[idx + 1..],
        None => qualified_name,
    }
}

/// All entities of one project snapshot, keyed by fully-qualified name
///
/// Ordered by name so every downstream traversal is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityModel {
    entities: BTreeMap<String, Entity>,
}

impl EntityModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. Returns false (and keeps the first) on a duplicate name.
    pub fn insert(&mut self, entity: Entity) -> bool {
        match self.entities.entry(entity.qualified_name.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entity);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, qualified_name: &str) -> Option<&Entity> {
        self.entities.get(qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.entities.contains_key(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Distinct packages in the snapshot
    pub fn packages(&self) -> BTreeSet<&str> {
        self.entities.values().map(|e| e.package.as_str()).collect()
    }

    /// Member id -> normalized body, for every callable that has a body
    pub fn method_bodies(&self) -> BTreeMap<String, &str> {
        let mut bodies = BTreeMap::new();
        for entity in self.entities.values() {
            for member in entity.callables() {
                if let Some(body) = member.body.as_deref() {
                    bodies.insert(entity.member_id(member), body);
                }
            }
        }
        bodies
    }

    /// Member id -> cyclomatic complexity, for every callable
    pub fn method_complexity(&self) -> BTreeMap<String, usize> {
        let mut complexity = BTreeMap::new();
        for entity in self.entities.values() {
            for member in entity.callables() {
                complexity.insert(entity.member_id(member), member.complexity.max(1));
            }
        }
        complexity
    }
}

impl FromIterator<Entity> for EntityModel {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut model = Self::new();
        for entity in iter {
            model.insert(entity);
        }
        model
    }
}

/// A source file the front-end could not turn into entities
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// FNV-1a 64-bit hash, used for stable cache keys
pub fn fnv1a_hash(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    input.bytes().fold(OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(PRIME)
    })
}
