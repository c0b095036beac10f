use super::{node_text, walk, RawSpecifier};
use crate::types::SpecifierKind;
use tree_sitter::Node;

/// Callees whose first string argument names a module.
const DYNAMIC_IMPORTERS: &[&str] = &["importlib.import_module", "import_module", "__import__"];

pub(super) fn collect(root: Node<'_>, src: &[u8], out: &mut Vec<RawSpecifier>) {
    walk(root, |node| match node.kind() {
        "import_statement" => {
            for name in imported_names(node) {
                push_dotted(name, src, SpecifierKind::DottedModule, out);
            }
            false
        }
        "import_from_statement" => {
            from_import(node, src, out);
            false
        }
        "future_import_statement" => {
            out.push(RawSpecifier::new(
                "__future__",
                SpecifierKind::DottedModule,
                node.start_byte(),
            ));
            false
        }
        "call" => {
            dynamic_import(node, src, out);
            true
        }
        _ => true,
    });
}

/// `from x import y`: the module itself, except for dot-only modules where
/// each imported name may be a sibling module. `from .. import *` names the
/// package.
fn from_import(node: Node<'_>, src: &[u8], out: &mut Vec<RawSpecifier>) {
    let Some(module) = node.child_by_field_name("module_name") else {
        return;
    };
    let raw = node_text(module, src);
    if raw.is_empty() {
        return;
    }
    if !raw.bytes().all(|b| b == b'.') {
        out.push(RawSpecifier::new(raw, kind_of(raw), module.start_byte()));
        return;
    }

    let names = imported_names(node);
    if names.is_empty() {
        out.push(RawSpecifier::new(
            raw,
            SpecifierKind::RelativePath,
            module.start_byte(),
        ));
    }
    for name in names {
        let text = node_text(name, src);
        if is_dotted(text) {
            out.push(RawSpecifier::new(
                format!("{raw}{text}"),
                SpecifierKind::ImportedName,
                name.start_byte(),
            ));
        }
    }
}

/// The dotted name of each `name` field, looking through `x as y`.
fn imported_names(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|name| match name.kind() {
            "aliased_import" => name.child_by_field_name("name"),
            _ => Some(name),
        })
        .collect()
}

fn push_dotted(name: Node<'_>, src: &[u8], kind: SpecifierKind, out: &mut Vec<RawSpecifier>) {
    let text = node_text(name, src);
    if is_dotted(text) {
        out.push(RawSpecifier::new(text, kind, name.start_byte()));
    }
}

/// `importlib.import_module("x")` and `__import__("x")` with a plain literal.
fn dynamic_import(call: Node<'_>, src: &[u8], out: &mut Vec<RawSpecifier>) {
    let callee = call
        .child_by_field_name("function")
        .map(|f| node_text(f, src))
        .unwrap_or_default();
    if !DYNAMIC_IMPORTERS.contains(&callee) {
        return;
    }
    let Some(first) = call
        .child_by_field_name("arguments")
        .and_then(|args| args.named_child(0))
    else {
        return;
    };
    if let Some((raw, offset)) = string_literal(first, src) {
        let module = raw.trim_start_matches('.');
        if is_dotted(module) {
            out.push(RawSpecifier::new(raw, kind_of(raw), offset));
        }
    }
}

/// Content of a string without interpolation, with its byte offset.
fn string_literal<'s>(node: Node<'_>, src: &'s [u8]) -> Option<(&'s str, usize)> {
    if node.kind() != "string" {
        return None;
    }
    let mut cursor = node.walk();
    let mut content = None;
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "string_content" if content.is_none() => content = Some(child),
            "string_start" | "string_end" => {}
            _ => return None,
        }
    }
    content.map(|c| (node_text(c, src), c.start_byte()))
}

fn kind_of(module: &str) -> SpecifierKind {
    if module.starts_with('.') {
        SpecifierKind::RelativePath
    } else {
        SpecifierKind::DottedModule
    }
}

fn is_dotted(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !name.ends_with('.')
}
