use super::{node_text, walk, RawSpecifier};
use crate::types::SpecifierKind;
use tree_sitter::Node;

/// Static `import`/`export ... from`, side-effect imports, TypeScript
/// `import x = require()`, and `require()` / dynamic `import()` calls with a
/// literal argument.
pub(super) fn collect(root: Node<'_>, src: &[u8], out: &mut Vec<RawSpecifier>) {
    walk(root, |node| match node.kind() {
        "import_statement" => {
            if let Some(source) = import_source(node) {
                push_literal(source, src, out);
            }
            false
        }
        "export_statement" => {
            match node.child_by_field_name("source") {
                Some(source) => {
                    push_literal(source, src, out);
                    false
                }
                // `export const x = require('./y')`
                None => true,
            }
        }
        "call_expression" => {
            if is_import_call(node, src) {
                if let Some(arg) = node
                    .child_by_field_name("arguments")
                    .and_then(|args| args.named_child(0))
                {
                    push_literal(arg, src, out);
                }
            }
            true
        }
        _ => true,
    });
}

fn import_source(node: Node<'_>) -> Option<Node<'_>> {
    if let Some(source) = node.child_by_field_name("source") {
        return Some(source);
    }
    let mut cursor = node.walk();
    let clause = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "import_require_clause")?;
    let mut cursor = clause.walk();
    let found = clause
        .named_children(&mut cursor)
        .find(|child| child.kind() == "string");
    found
}

fn is_import_call(call: Node<'_>, src: &[u8]) -> bool {
    match call.child_by_field_name("function") {
        Some(callee) if callee.kind() == "import" => true,
        Some(callee) if callee.kind() == "identifier" => node_text(callee, src) == "require",
        _ => false,
    }
}

/// Plain quoted string; template strings and expressions are not followed.
fn push_literal(node: Node<'_>, src: &[u8], out: &mut Vec<RawSpecifier>) {
    if node.kind() != "string" {
        return;
    }
    let text = node_text(node, src);
    let inner = text
        .get(1..text.len().saturating_sub(1))
        .unwrap_or_default();
    let raw = inner.trim();
    if raw.is_empty() || raw.contains('\n') {
        return;
    }
    let lead = inner.len() - inner.trim_start().len();
    out.push(RawSpecifier::new(
        raw,
        kind_of(raw),
        node.start_byte() + 1 + lead,
    ));
}

pub(crate) fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

fn kind_of(specifier: &str) -> SpecifierKind {
    if is_relative(specifier) {
        SpecifierKind::RelativePath
    } else {
        SpecifierKind::PackageQualified
    }
}

#[cfg(test)]
mod tests {
    use crate::language::Language;
    use crate::types::SpecifierKind;
    use crate::SourceScan;

    fn scan(language: Language, text: &str) -> Vec<(String, SpecifierKind, usize)> {
        SourceScan::new("a/b.ts", language, text)
            .specifiers()
            .map(|s| (s.raw, s.kind, s.line))
            .collect()
    }

    fn raws(text: &str) -> Vec<String> {
        scan(Language::TypeScript, text)
            .into_iter()
            .map(|(raw, _, _)| raw)
            .collect()
    }

    #[test]
    fn test_default_import_relative() {
        assert_eq!(
            scan(Language::TypeScript, "import x from './c'\n"),
            vec![("./c".to_string(), SpecifierKind::RelativePath, 1)]
        );
    }

    #[test]
    fn test_import_forms() {
        let text = r#"
import React from "react";
import { a,
  b } from '../lib/util';
import * as ns from './ns';
import type { T } from './types';
import './side-effect.css';
export { c } from "./c";
export * from './all';
const fs = require('fs');
async function load() {
  return await import('./lazy');
}
import legacy = require("./legacy");
"#;
        assert_eq!(
            raws(text),
            vec![
                "react",
                "../lib/util",
                "./ns",
                "./types",
                "./side-effect.css",
                "./c",
                "./all",
                "fs",
                "./lazy",
                "./legacy",
            ]
        );
    }

    #[test]
    fn test_multiline_import_reports_source_line() {
        let found = scan(Language::JavaScript, "import {\n  a,\n  b,\n} from './x';\n");
        assert_eq!(found, vec![("./x".to_string(), SpecifierKind::RelativePath, 4)]);
    }

    #[test]
    fn test_commented_imports_ignored() {
        let text = "// import a from './a'\n/* require('./b') */\nconst url = 'http://example.com'; // import('./c')\n";
        assert!(raws(text).is_empty());
    }

    #[test]
    fn test_import_text_in_strings_ignored() {
        let text = "const doc = \"import x from './fake'\";\nconst tpl = `require('./also-fake')`;\n";
        assert!(raws(text).is_empty());
    }

    #[test]
    fn test_non_literal_calls_ignored() {
        assert!(raws("require(name);\nimport(`./${x}`);\nexport const y = 1;\n").is_empty());
    }

    #[test]
    fn test_require_inside_export() {
        assert_eq!(
            scan(Language::JavaScript, "export const cfg = require('./cfg');\n"),
            vec![("./cfg".to_string(), SpecifierKind::RelativePath, 1)]
        );
    }

    #[test]
    fn test_member_require_is_not_an_import() {
        assert!(raws("loader.require('./x');\n").is_empty());
    }

    #[test]
    fn test_package_kinds() {
        let found = scan(Language::JavaScript, "import x from '@scope/pkg/sub';\nimport y from '/abs/path';\n");
        assert_eq!(found[0].1, SpecifierKind::PackageQualified);
        assert_eq!(found[1].1, SpecifierKind::RelativePath);
    }
}
