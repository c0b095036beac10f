use super::{node_text, walk, RawSpecifier};
use crate::types::SpecifierKind;
use tree_sitter::Node;

pub(super) fn collect(root: Node<'_>, src: &[u8], out: &mut Vec<RawSpecifier>) {
    walk(root, |node| match node.kind() {
        "mod_item" => {
            // Inline modules carry their own items; only `mod x;` names a file.
            if node.child_by_field_name("body").is_some() {
                return true;
            }
            if let Some(name) = node.child_by_field_name("name") {
                let raw = node_text(name, src).trim_start_matches("r#");
                if !raw.is_empty() {
                    out.push(RawSpecifier::new(
                        raw,
                        SpecifierKind::ModuleDeclaration,
                        name.start_byte(),
                    ));
                }
            }
            false
        }
        "use_declaration" => {
            if let Some(argument) = node.child_by_field_name("argument") {
                let mut paths = Vec::new();
                flatten(argument, src, "", &mut paths);
                let mut seen = Vec::new();
                for path in paths {
                    if path.is_empty() || seen.contains(&path) {
                        continue;
                    }
                    let kind = kind_of(&path);
                    seen.push(path.clone());
                    out.push(RawSpecifier::new(path, kind, argument.start_byte()));
                }
            }
            false
        }
        // Token trees are opaque; a `use` inside `macro_rules!` is not one.
        "macro_definition" | "macro_invocation" => false,
        _ => true,
    });
}

/// First path segments that make a `use` path crate-local.
const LOCAL_ANCHORS: &[&str] = &["crate", "self", "super"];

fn kind_of(path: &str) -> SpecifierKind {
    let first = path.split("::").next().unwrap_or_default();
    if LOCAL_ANCHORS.contains(&first) {
        SpecifierKind::RelativePath
    } else {
        SpecifierKind::PackageQualified
    }
}

/// Flatten a use tree into full paths.
///
/// `a::{b, c::{d as e, self}, f::*}` gives `a::b`, `a::c::d`, `a::c`, `a::f`.
/// Globs name the module they glob over.
fn flatten(node: Node<'_>, src: &[u8], prefix: &str, out: &mut Vec<String>) {
    match node.kind() {
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                flatten(path, src, prefix, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for item in node.named_children(&mut cursor) {
                flatten(item, src, prefix, out);
            }
        }
        "scoped_use_list" => {
            let nested = match node.child_by_field_name("path") {
                Some(path) => join(prefix, &path_text(path, src)),
                None => prefix.to_string(),
            };
            if let Some(list) = node.child_by_field_name("list") {
                flatten(list, src, &nested, out);
            }
        }
        "use_wildcard" => match node.named_child(0) {
            Some(path) => out.push(join(prefix, &path_text(path, src))),
            None => out.push(join(prefix, "self")),
        },
        "self" => out.push(join(prefix, "self")),
        "line_comment" | "block_comment" | "attribute_item" => {}
        _ => out.push(join(prefix, &path_text(node, src))),
    }
}

/// `a::self` under a prefix is the prefix itself.
fn join(prefix: &str, path: &str) -> String {
    match (prefix, path) {
        (_, "") => String::new(),
        ("", path) => path.to_string(),
        (prefix, "self") => prefix.to_string(),
        (prefix, path) => format!("{prefix}::{path}"),
    }
}

/// Path text with whitespace, leading `::` and a trailing `::self` removed.
fn path_text(node: Node<'_>, src: &[u8]) -> String {
    let compact: String = node_text(node, src)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let path = compact.trim_start_matches("::");
    path.strip_suffix("::self").unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::SourceScan;

    fn scan(text: &str) -> Vec<(String, SpecifierKind, usize)> {
        SourceScan::new("src/lib.rs", Language::Rust, text)
            .specifiers()
            .map(|s| (s.raw, s.kind, s.line))
            .collect()
    }

    fn raws(text: &str) -> Vec<String> {
        scan(text).into_iter().map(|(raw, _, _)| raw).collect()
    }

    #[test]
    fn test_mod_declarations() {
        let text = "mod config;\npub mod error;\n#[cfg(test)]\nmod tests {\n}\npub(crate) mod types;\n";
        assert_eq!(
            scan(text),
            vec![
                ("config".to_string(), SpecifierKind::ModuleDeclaration, 1),
                ("error".to_string(), SpecifierKind::ModuleDeclaration, 2),
                ("types".to_string(), SpecifierKind::ModuleDeclaration, 6),
            ]
        );
    }

    #[test]
    fn test_attributed_mod_declaration() {
        assert_eq!(raws("#[cfg(feature = \"x\")] mod gated;\n"), vec!["gated"]);
    }

    #[test]
    fn test_simple_use_paths() {
        let found = scan("use crate::config::Config;\nuse std::path::Path;\npub use self::types::*;\n");
        assert_eq!(
            found,
            vec![
                ("crate::config::Config".to_string(), SpecifierKind::RelativePath, 1),
                ("std::path::Path".to_string(), SpecifierKind::PackageQualified, 2),
                ("self::types".to_string(), SpecifierKind::RelativePath, 3),
            ]
        );
    }

    #[test]
    fn test_use_tree_expansion() {
        let text = "use crate::{\n    error::{Result, TraceError as E},\n    types::{self},\n    roots,\n};\n";
        assert_eq!(
            raws(text),
            vec![
                "crate::error::Result",
                "crate::error::TraceError",
                "crate::types",
                "crate::roots",
            ]
        );
    }

    #[test]
    fn test_use_tree_self_and_glob() {
        assert_eq!(
            raws("use super::{self, parent::*};\n"),
            vec!["super", "super::parent"]
        );
    }

    #[test]
    fn test_leading_colons_and_dedup() {
        assert_eq!(
            raws("use ::serde::{Serialize, Serialize as S};\n"),
            vec!["serde::Serialize"]
        );
    }

    #[test]
    fn test_commented_use_ignored() {
        assert_eq!(
            raws("// use crate::gone;\n/* mod hidden; */\nuse crate::kept;\n"),
            vec!["crate::kept"]
        );
    }

    #[test]
    fn test_use_and_mod_in_strings_ignored() {
        let text = "const DOC: &str = \"use crate::fake;\\nmod fake;\";\nuse crate::real;\n";
        assert_eq!(raws(text), vec!["crate::real"]);
    }

    #[test]
    fn test_nested_items_are_found() {
        let text = "fn run() {\n    use crate::inner::Thing;\n}\nmod tests {\n    use super::*;\n}\n";
        assert_eq!(raws(text), vec!["crate::inner::Thing", "super"]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a::b"), "a::b");
        assert_eq!(join("a", "self"), "a");
        assert_eq!(join("a", "b"), "a::b");
        assert_eq!(join("a", ""), "");
    }
}
