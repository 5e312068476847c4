//! Java language detector
//!
//! Turns a tree-sitter Java syntax tree into entities. Resolution here is
//! purely syntactic: call scopes are typed from parameters, locals and fields
//! of the enclosing class, and every written type name gets a hint (its import
//! or the same-package name) that the graph builder may confirm.

use std::collections::{BTreeSet, HashMap};

use tree_sitter::{Node, Tree};

use crate::detectors::common::{
    child_of_kind, get_node_text, last_segment, line_count, line_span, node_str, walk_descendants,
};
use crate::duplication::normalize_body;
use crate::resolve::{extract_class_name, is_primitive, type_names};
use crate::schema::{qualify, Entity, EntityKind, Member, Reference, Visibility};

/// Extract every type declaration of a file, nested types included
pub fn extract(file_path: &str, source: &str, tree: &Tree) -> Vec<Entity> {
    let root = tree.root_node();
    let ctx = FileContext::new(file_path, source, &root);

    let mut entities = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if type_kind(child.kind()).is_some() {
            extract_type(&ctx, &child, None, &mut entities);
        }
    }
    entities
}

fn type_kind(kind: &str) -> Option<EntityKind> {
    match kind {
        "class_declaration" => Some(EntityKind::Class),
        "interface_declaration" | "annotation_type_declaration" => Some(EntityKind::Interface),
        "enum_declaration" => Some(EntityKind::Enum),
        "record_declaration" => Some(EntityKind::Record),
        _ => None,
    }
}

/// Per-file facts: package and single-type imports
struct FileContext<'s> {
    file: &'s str,
    source: &'s str,
    package: String,
    imports: HashMap<String, String>,
}

impl<'s> FileContext<'s> {
    fn new(file: &'s str, source: &'s str, root: &Node) -> Self {
        let mut package = String::new();
        let mut imports = HashMap::new();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    let mut inner = child.walk();
                    let name = child
                        .named_children(&mut inner)
                        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"));
                    if let Some(name) = name {
                        package = get_node_text(&name, source);
                    }
                }
                "import_declaration" => {
                    let text = node_str(&child, source);
                    let is_static = text.contains("static ");
                    let is_wildcard = child_of_kind(&child, "asterisk").is_some();
                    if is_static || is_wildcard {
                        continue;
                    }
                    let mut inner = child.walk();
                    let name = child
                        .named_children(&mut inner)
                        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"));
                    if let Some(name) = name {
                        let qualified = get_node_text(&name, source);
                        imports.insert(last_segment(&qualified).to_string(), qualified);
                    }
                }
                _ => {}
            }
        }

        Self {
            file,
            source,
            package,
            imports,
        }
    }

    fn text(&self, node: &Node) -> &'s str {
        node_str(node, self.source)
    }

    /// Qualified-name guess for a written type
    fn hint_for(&self, written: &str) -> Option<String> {
        let base = extract_class_name(written);
        if base.is_empty() || is_primitive(base) {
            return None;
        }
        if base.contains('.') {
            return Some(base.to_string());
        }
        if let Some(imported) = self.imports.get(base) {
            return Some(imported.clone());
        }
        Some(qualify(&self.package, base))
    }
}

/// The enclosing type as seen from its member bodies
struct TypeScope<'a> {
    qualified_name: &'a str,
    simple_name: &'a str,
    superclass: Option<&'a str>,
    fields: &'a HashMap<String, String>,
}

/// Modifiers of a declaration
#[derive(Default)]
struct Modifiers {
    visibility: Visibility,
    is_static: bool,
    is_abstract: bool,
    annotations: Vec<String>,
}

fn read_modifiers(node: &Node, source: &str) -> Modifiers {
    let mut mods = Modifiers::default();
    let Some(modifiers) = child_of_kind(node, "modifiers") else {
        return mods;
    };

    let mut cursor = modifiers.walk();
    for child in modifiers.children(&mut cursor) {
        match child.kind() {
            "public" => mods.visibility = Visibility::Public,
            "protected" => mods.visibility = Visibility::Protected,
            "private" => mods.visibility = Visibility::Private,
            "static" => mods.is_static = true,
            "abstract" => mods.is_abstract = true,
            "marker_annotation" | "annotation" => {
                if let Some(name) = child.child_by_field_name("name") {
                    mods.annotations
                        .push(last_segment(node_str(&name, source)).to_string());
                }
            }
            _ => {}
        }
    }
    mods
}

fn extract_type(ctx: &FileContext, node: &Node, outer: Option<&str>, out: &mut Vec<Entity>) {
    let Some(kind) = type_kind(node.kind()) else {
        return;
    };
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(&name_node);
    let local_name = match outer {
        Some(outer) => format!("{}.{}", outer, name),
        None => name.to_string(),
    };

    let mods = read_modifiers(node, ctx.source);
    let (start, end) = line_span(node);
    let mut entity = Entity::new(kind, &ctx.package, name, ctx.file).with_lines(start, end);
    entity.qualified_name = qualify(&ctx.package, &local_name);
    entity.is_abstract = mods.is_abstract || kind == EntityKind::Interface;
    entity.is_static = mods.is_static;
    entity.annotations = mods.annotations;

    if let Some(superclass) = node.child_by_field_name("superclass") {
        let mut cursor = superclass.walk();
        for ty in superclass.named_children(&mut cursor) {
            entity.extends.push(ctx.text(&ty).to_string());
        }
    }

    // Implemented interfaces; for interfaces the extended ones
    let interfaces = node
        .child_by_field_name("interfaces")
        .or_else(|| child_of_kind(node, "super_interfaces"))
        .or_else(|| child_of_kind(node, "extends_interfaces"));
    if let Some(interfaces) = interfaces {
        if let Some(list) = child_of_kind(&interfaces, "type_list") {
            let mut cursor = list.walk();
            for ty in list.named_children(&mut cursor) {
                let written = ctx.text(&ty).to_string();
                if kind == EntityKind::Interface {
                    entity.extends.push(written);
                } else {
                    entity.implements.push(written);
                }
            }
        }
    }

    // Record components are fields
    if kind == EntityKind::Record {
        if let Some(params) = node.child_by_field_name("parameters") {
            for (param_name, param_type) in read_parameters(&params, ctx.source) {
                entity.members.push(
                    Member::field(&param_name, &param_type).with_visibility(Visibility::Private),
                );
            }
        }
    }

    let Some(body) = node.child_by_field_name("body") else {
        out.push(entity);
        return;
    };

    // Field declarations first so member bodies can see every field type
    let declarations = body_declarations(&body);
    let mut field_types: HashMap<String, String> = entity
        .fields()
        .filter_map(|f| f.type_name.clone().map(|t| (f.name.clone(), t)))
        .collect();
    for decl in &declarations {
        if matches!(decl.kind(), "field_declaration" | "constant_declaration") {
            if let Some(ty) = decl.child_by_field_name("type") {
                let ty = ctx.text(&ty);
                let mut cursor = decl.walk();
                for declarator in decl.children_by_field_name("declarator", &mut cursor) {
                    if let Some(var) = declarator.child_by_field_name("name") {
                        field_types.insert(ctx.text(&var).to_string(), ty.to_string());
                    }
                }
            }
        }
    }

    let superclass = entity.extends.first().cloned();
    let qualified = entity.qualified_name.clone();
    let scope = TypeScope {
        qualified_name: &qualified,
        simple_name: name,
        superclass: superclass.as_deref(),
        fields: &field_types,
    };
    let in_interface = kind == EntityKind::Interface;
    let mut nested = Vec::new();

    for decl in &declarations {
        match decl.kind() {
            "field_declaration" | "constant_declaration" => {
                let fields = extract_fields(ctx, &scope, decl, in_interface, &mut entity.references);
                entity.members.extend(fields);
            }
            "method_declaration" | "annotation_type_element_declaration" => {
                entity
                    .members
                    .push(extract_callable(ctx, &scope, decl, false, in_interface));
            }
            "constructor_declaration" | "compact_constructor_declaration" => {
                entity
                    .members
                    .push(extract_callable(ctx, &scope, decl, true, in_interface));
            }
            "static_initializer" | "block" | "enum_constant" => {
                let mut scan = BodyScan::new(ctx, &scope, HashMap::new());
                scan.scan(decl);
                entity.references.extend(scan.references);
            }
            kind if type_kind(kind).is_some() => nested.push(*decl),
            _ => {}
        }
    }

    out.push(entity);
    for decl in nested {
        extract_type(ctx, &decl, Some(&local_name), out);
    }
}

/// Member declarations of a class, interface, enum or record body
fn body_declarations<'t>(body: &Node<'t>) -> Vec<Node<'t>> {
    let mut decls = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() == "enum_body_declarations" {
            let mut inner = child.walk();
            decls.extend(child.named_children(&mut inner));
        } else {
            decls.push(child);
        }
    }
    decls
}

fn extract_fields(
    ctx: &FileContext,
    scope: &TypeScope,
    decl: &Node,
    in_interface: bool,
    entity_refs: &mut Vec<Reference>,
) -> Vec<Member> {
    let mods = read_modifiers(decl, ctx.source);
    let Some(ty) = decl.child_by_field_name("type") else {
        return Vec::new();
    };
    let ty = ctx.text(&ty);

    let mut fields = Vec::new();
    let mut cursor = decl.walk();
    for declarator in decl.children_by_field_name("declarator", &mut cursor) {
        let Some(var) = declarator.child_by_field_name("name") else {
            continue;
        };
        let visibility = if in_interface && mods.visibility == Visibility::Package {
            Visibility::Public
        } else {
            mods.visibility
        };

        let mut field = Member::field(ctx.text(&var), ty)
            .with_visibility(visibility)
            .with_static(mods.is_static || in_interface)
            .with_line_count(line_count(decl));
        field.annotations = mods.annotations.clone();
        fields.push(field);

        if let Some(value) = declarator.child_by_field_name("value") {
            let mut scan = BodyScan::new(ctx, scope, HashMap::new());
            scan.scan(&value);
            entity_refs.extend(scan.references);
        }
    }
    fields
}

/// `(name, type)` of each formal parameter; varargs keep their `...`
fn read_parameters(params: &Node, source: &str) -> Vec<(String, String)> {
    let mut result = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "formal_parameter" => {
                let ty = param
                    .child_by_field_name("type")
                    .map(|t| node_str(&t, source).to_string())
                    .unwrap_or_default();
                let name = param
                    .child_by_field_name("name")
                    .map(|n| node_str(&n, source).to_string())
                    .unwrap_or_default();
                let dims = param
                    .child_by_field_name("dimensions")
                    .map(|d| node_str(&d, source).to_string())
                    .unwrap_or_default();
                result.push((name, format!("{}{}", ty, dims)));
            }
            "spread_parameter" => {
                let mut inner = param.walk();
                let mut ty = String::new();
                let mut name = String::new();
                for part in param.named_children(&mut inner) {
                    match part.kind() {
                        "modifiers" => {}
                        "variable_declarator" => {
                            name = part
                                .child_by_field_name("name")
                                .map(|n| node_str(&n, source).to_string())
                                .unwrap_or_default();
                        }
                        _ if ty.is_empty() => ty = node_str(&part, source).to_string(),
                        _ => {}
                    }
                }
                result.push((name, format!("{}...", ty)));
            }
            _ => {}
        }
    }
    result
}

fn extract_callable(
    ctx: &FileContext,
    scope: &TypeScope,
    node: &Node,
    is_constructor: bool,
    in_interface: bool,
) -> Member {
    let mods = read_modifiers(node, ctx.source);

    let mut member = if is_constructor {
        Member::constructor()
    } else {
        let name = node
            .child_by_field_name("name")
            .map(|n| ctx.text(&n))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("type")
            .map(|t| ctx.text(&t))
            .unwrap_or("void");
        Member::method(name, return_type)
    };

    member.visibility = if in_interface && mods.visibility == Visibility::Package {
        Visibility::Public
    } else {
        mods.visibility
    };
    member.is_static = mods.is_static;
    member.annotations = mods.annotations;
    member.line_count = line_count(node);

    let mut locals = HashMap::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        for (name, ty) in read_parameters(&params, ctx.source) {
            locals.insert(name.clone(), ty.trim_end_matches("...").to_string());
            member = member.with_parameter(&name, &ty);
        }
    }

    match node.child_by_field_name("body") {
        Some(body) => {
            let mut scan = BodyScan::new(ctx, scope, locals);
            scan.collect_locals(&body);
            scan.scan(&body);

            member.body = Some(normalize_body(&text_without_comments(&body, ctx.source)));
            member.complexity = scan.complexity;
            member.references = scan.references;
            member.accessed_fields = scan.accessed_fields.into_iter().collect();
        }
        None => {
            member.is_abstract = mods.is_abstract || (in_interface && !mods.is_static);
        }
    }

    member
}

/// Source text of `node` with every comment node replaced by a space
fn text_without_comments(node: &Node, source: &str) -> String {
    let mut comments = Vec::new();
    walk_descendants(node, &mut |child| {
        if matches!(child.kind(), "line_comment" | "block_comment") {
            comments.push(child.byte_range());
            false
        } else {
            true
        }
    });

    let range = node.byte_range();
    let mut text = String::with_capacity(range.len());
    let mut pos = range.start;
    for comment in comments {
        text.push_str(source.get(pos..comment.start).unwrap_or(""));
        text.push(' ');
        pos = comment.end;
    }
    text.push_str(source.get(pos..range.end).unwrap_or(""));
    text
}

/// Walks one member body collecting references, field accesses and branches
struct BodyScan<'a, 's> {
    ctx: &'a FileContext<'s>,
    scope: &'a TypeScope<'a>,
    locals: HashMap<String, String>,
    references: Vec<Reference>,
    accessed_fields: BTreeSet<String>,
    complexity: usize,
}

impl<'a, 's> BodyScan<'a, 's> {
    fn new(ctx: &'a FileContext<'s>, scope: &'a TypeScope<'a>, locals: HashMap<String, String>) -> Self {
        Self {
            ctx,
            scope,
            locals,
            references: Vec::new(),
            accessed_fields: BTreeSet::new(),
            complexity: 1,
        }
    }

    /// Record declared local variable types before scanning uses
    fn collect_locals(&mut self, node: &Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "local_variable_declaration" => {
                    if let Some(ty) = child.child_by_field_name("type") {
                        let ty = self.ctx.text(&ty).to_string();
                        let mut inner = child.walk();
                        for declarator in child.children_by_field_name("declarator", &mut inner) {
                            if let Some(name) = declarator.child_by_field_name("name") {
                                self.locals.insert(self.ctx.text(&name).to_string(), ty.clone());
                            }
                        }
                    }
                }
                "enhanced_for_statement" | "resource" | "catch_formal_parameter" => {
                    let ty = child
                        .child_by_field_name("type")
                        .or_else(|| child_of_kind(&child, "catch_type"));
                    if let (Some(ty), Some(name)) = (ty, child.child_by_field_name("name")) {
                        self.locals
                            .insert(self.ctx.text(&name).to_string(), self.ctx.text(&ty).to_string());
                    }
                }
                _ => {}
            }
            self.collect_locals(&child);
        }
    }

    fn own_type(&self) -> (Option<String>, Option<String>) {
        (
            Some(self.scope.simple_name.to_string()),
            Some(self.scope.qualified_name.to_string()),
        )
    }

    fn written_type(&self, written: &str) -> (Option<String>, Option<String>) {
        (Some(written.to_string()), self.ctx.hint_for(written))
    }

    /// Static type of a call or field-access scope, when it can be read off syntax
    fn scope_type(&self, object: &Node) -> (Option<String>, Option<String>) {
        match object.kind() {
            "this" => self.own_type(),
            "super" => match self.scope.superclass {
                Some(superclass) => self.written_type(superclass),
                None => (None, None),
            },
            "identifier" => {
                let name = self.ctx.text(object);
                if let Some(ty) = self.locals.get(name) {
                    self.written_type(ty)
                } else if let Some(ty) = self.scope.fields.get(name) {
                    self.written_type(ty)
                } else if name.starts_with(|c: char| c.is_ascii_uppercase()) {
                    self.written_type(name)
                } else {
                    (None, None)
                }
            }
            "field_access" => {
                let is_this = object
                    .child_by_field_name("object")
                    .is_some_and(|o| o.kind() == "this");
                let field = object
                    .child_by_field_name("field")
                    .map(|f| self.ctx.text(&f))
                    .unwrap_or_default();
                match self.scope.fields.get(field) {
                    Some(ty) if is_this => self.written_type(ty),
                    _ => (None, None),
                }
            }
            "object_creation_expression" | "cast_expression" => match object.child_by_field_name("type") {
                Some(ty) => self.written_type(self.ctx.text(&ty)),
                None => (None, None),
            },
            "parenthesized_expression" => match object.named_child(0) {
                Some(inner) => self.scope_type(&inner),
                None => (None, None),
            },
            _ => (None, None),
        }
    }

    fn push(&mut self, reference: Reference, hint: Option<String>) {
        let reference = match hint {
            Some(hint) => reference.resolved_as(&hint),
            None => reference,
        };
        self.references.push(reference);
    }

    fn type_uses(&mut self, written: &str) {
        for name in type_names(written) {
            let hint = self.ctx.hint_for(name);
            self.push(Reference::type_use(name), hint);
        }
    }

    fn is_field_use(&self, node: &Node, name: &str) -> bool {
        if !self.scope.fields.contains_key(name) || self.locals.contains_key(name) {
            return false;
        }
        let Some(parent) = node.parent() else {
            return true;
        };
        match parent.kind() {
            "method_invocation" => parent.child_by_field_name("name") != Some(*node),
            "field_access" => parent.child_by_field_name("field") != Some(*node),
            "variable_declarator" => parent.child_by_field_name("name") != Some(*node),
            _ => true,
        }
    }

    fn scan(&mut self, node: &Node) {
        match node.kind() {
            "if_statement" | "while_statement" | "for_statement" | "enhanced_for_statement"
            | "catch_clause" | "ternary_expression" => self.complexity += 1,
            "switch_label" => {
                // `default` carries no expression
                if node.named_child_count() > 0 {
                    self.complexity += 1;
                }
            }
            "method_invocation" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.ctx.text(&n))
                    .unwrap_or_default();
                let (target, hint) = match node.child_by_field_name("object") {
                    Some(object) => self.scope_type(&object),
                    None => self.own_type(),
                };
                self.push(Reference::call(target.as_deref(), name), hint);
            }
            "object_creation_expression" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    let written = self.ctx.text(&ty);
                    let hint = self.ctx.hint_for(written);
                    self.push(Reference::instantiation(written), hint);
                }
            }
            "field_access" => {
                let field = node
                    .child_by_field_name("field")
                    .map(|f| self.ctx.text(&f))
                    .unwrap_or_default();
                if let Some(object) = node.child_by_field_name("object") {
                    if object.kind() == "this" && self.scope.fields.contains_key(field) {
                        self.accessed_fields.insert(field.to_string());
                    }
                    let (target, hint) = self.scope_type(&object);
                    self.push(Reference::field_access(target.as_deref(), field), hint);
                }
            }
            "identifier" => {
                let name = self.ctx.text(node);
                if self.is_field_use(node, name) {
                    self.accessed_fields.insert(name.to_string());
                }
            }
            "local_variable_declaration" | "cast_expression" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    let written = self.ctx.text(&ty);
                    self.type_uses(written);
                }
            }
            "catch_type" => {
                let mut cursor = node.walk();
                let written: Vec<&str> = node
                    .named_children(&mut cursor)
                    .map(|t| self.ctx.text(&t))
                    .collect();
                for ty in written {
                    self.type_uses(ty);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.scan(&child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MemberKind, ReferenceKind};

    fn parse(source: &str) -> Vec<Entity> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        extract("src/main/java/com/acme/Order.java", source, &tree)
    }

    const ORDER: &str = r#"
package com.acme;

import com.acme.repo.OrderRepository;
import java.util.List;

@Service
public class OrderService extends BaseService implements Auditable, Closeable {
    private final OrderRepository repository;
    private int processed;

    public OrderService(OrderRepository repository) {
        this.repository = repository;
    }

    public void process(List<Order> orders, boolean force) {
        for (Order order : orders) {
            if (force || order.isValid()) {
                repository.save(order);
                processed++;
            }
        }
        Invoice invoice = new Invoice(processed);
        Helper.log(invoice);
    }

    private static int clamp(int value) {
        return value > 10 ? 10 : value;
    }

    static class Helper {
        static void log(Object o) {}
    }
}
"#;

    #[test]
    fn test_entities_and_nesting() {
        let entities = parse(ORDER);
        let names: Vec<&str> = entities.iter().map(|e| e.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["com.acme.OrderService", "com.acme.OrderService.Helper"]);

        let service = &entities[0];
        assert_eq!(service.name, "OrderService");
        assert_eq!(service.package, "com.acme");
        assert_eq!(service.kind, EntityKind::Class);
        assert_eq!(service.extends, vec!["BaseService"]);
        assert_eq!(service.implements, vec!["Auditable", "Closeable"]);
        assert!(service.has_annotation("Service"));

        let helper = &entities[1];
        assert_eq!(helper.name, "Helper");
        assert!(helper.is_static);
    }

    #[test]
    fn test_members() {
        let entities = parse(ORDER);
        let service = &entities[0];

        let fields: Vec<&str> = service.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["repository", "processed"]);

        let ctor = service
            .members
            .iter()
            .find(|m| m.kind == MemberKind::Constructor)
            .unwrap();
        assert_eq!(service.member_id(ctor), "com.acme.OrderService.<init>(OrderRepository)");

        let process = service.methods().find(|m| m.name == "process").unwrap();
        assert_eq!(process.signature(), "(List<Order>,boolean)");
        assert_eq!(process.visibility, Visibility::Public);
        // enhanced for + if
        assert_eq!(process.complexity, 3);
        assert!(process.accessed_fields.contains(&"repository".to_string()));
        assert!(process.accessed_fields.contains(&"processed".to_string()));

        let clamp = service.methods().find(|m| m.name == "clamp").unwrap();
        assert!(clamp.is_static);
        assert_eq!(clamp.visibility, Visibility::Private);
        assert_eq!(clamp.complexity, 2);
    }

    #[test]
    fn test_references() {
        let entities = parse(ORDER);
        let process = entities[0].methods().find(|m| m.name == "process").unwrap();

        let save = process
            .references
            .iter()
            .find(|r| r.kind == ReferenceKind::MethodCall && r.member.as_deref() == Some("save"))
            .unwrap();
        assert_eq!(save.target.as_deref(), Some("OrderRepository"));
        assert_eq!(save.resolved.as_deref(), Some("com.acme.repo.OrderRepository"));

        let is_valid = process
            .references
            .iter()
            .find(|r| r.member.as_deref() == Some("isValid"))
            .unwrap();
        assert_eq!(is_valid.target.as_deref(), Some("Order"));
        assert_eq!(is_valid.resolved.as_deref(), Some("com.acme.Order"));

        assert!(process
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::Instantiation && r.target.as_deref() == Some("Invoice")));
        assert!(process
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::MethodCall && r.target.as_deref() == Some("Helper")));
        assert!(process
            .references
            .iter()
            .any(|r| r.kind == ReferenceKind::TypeUse && r.target.as_deref() == Some("Invoice")));
    }

    #[test]
    fn test_bodies_normalized() {
        let entities = parse(ORDER);
        let clamp = entities[0].methods().find(|m| m.name == "clamp").unwrap();
        assert_eq!(clamp.body.as_deref(), Some("{ return value > 10 ? 10 : value; }"));
    }

    #[test]
    fn test_comments_stripped_but_not_string_contents() {
        let entities = parse(
            r#"
package net;

class Client {
    String primary() {
        // primary endpoint
        return fetch("http://primary/api"); /* trailing */
    }

    String backup() {
        return fetch("http://backup/api");
    }

    String fetch(String url) { return url; }
}
"#,
        );
        let client = &entities[0];
        let primary = client.methods().find(|m| m.name == "primary").unwrap();
        let backup = client.methods().find(|m| m.name == "backup").unwrap();

        assert_eq!(primary.body.as_deref(), Some("{ return fetch(\"http://primary/api\"); }"));
        assert_eq!(backup.body.as_deref(), Some("{ return fetch(\"http://backup/api\"); }"));
        assert_ne!(primary.body, backup.body);
    }

    #[test]
    fn test_interface_and_enum() {
        let entities = parse(
            r#"
package shapes;

public interface Shape extends Comparable<Shape> {
    double area();
}

enum Color implements Named {
    RED, GREEN;

    public String label() { return name().toLowerCase(); }
}

record Point(int x, int y) {}
"#,
        );

        let shape = entities.iter().find(|e| e.name == "Shape").unwrap();
        assert_eq!(shape.kind, EntityKind::Interface);
        assert_eq!(shape.extends, vec!["Comparable<Shape>"]);
        let area = shape.methods().next().unwrap();
        assert!(area.is_abstract);
        assert!(area.body.is_none());

        let color = entities.iter().find(|e| e.name == "Color").unwrap();
        assert_eq!(color.kind, EntityKind::Enum);
        assert_eq!(color.implements, vec!["Named"]);
        assert_eq!(color.methods().count(), 1);

        let point = entities.iter().find(|e| e.name == "Point").unwrap();
        assert_eq!(point.kind, EntityKind::Record);
        assert_eq!(point.fields().count(), 2);
    }
}
