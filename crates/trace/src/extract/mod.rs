//! Specifier extraction.
//!
//! Python, JavaScript/TypeScript and Rust files are parsed with tree-sitter
//! and their import nodes walked in source order; string literals and
//! comments never produce specifiers. C and C++ have no grammar in the stack,
//! so `#include` lines are matched by regex after comments are blanked.

mod c;
mod javascript;
mod mask;
mod python;
mod rust;

pub(crate) use javascript::is_relative as is_relative_script_path;

use crate::language::Language;
use crate::types::{ImportSpecifier, SpecifierKind};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Specifier found by a language rule, before it is located in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawSpecifier {
    pub raw: String,
    pub kind: SpecifierKind,
    pub offset: usize,
}

impl RawSpecifier {
    pub(crate) fn new(raw: impl Into<String>, kind: SpecifierKind, offset: usize) -> Self {
        Self {
            raw: raw.into(),
            kind,
            offset,
        }
    }
}

/// A file's text prepared for specifier extraction.
///
/// ```
/// use context_trace::{Language, SourceScan};
///
/// let scan = SourceScan::new("svc.py", Language::Python, "from src.models.user import User\n");
/// let specs: Vec<_> = scan.specifiers().map(|s| s.raw).collect();
/// assert_eq!(specs, vec!["src.models.user"]);
/// ```
pub struct SourceScan<'t> {
    origin: PathBuf,
    language: Language,
    text: &'t str,
    lines: LineIndex,
}

impl<'t> SourceScan<'t> {
    pub fn new(origin: impl Into<PathBuf>, language: Language, text: &'t str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            origin: origin.into(),
            language,
            text,
            lines: LineIndex::new(text),
        }
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Specifiers in source order.
    pub fn specifiers(&self) -> Specifiers<'_, 't> {
        Specifiers {
            scan: self,
            found: self.collect().into_iter(),
        }
    }

    fn collect(&self) -> Vec<RawSpecifier> {
        let mut out = Vec::new();
        match self.language {
            Language::C | Language::Cpp => c::collect(&mask::mask_comments(self.text), &mut out),
            Language::Unknown => {}
            language => {
                let Some(tree) = self.parse() else {
                    return out;
                };
                let root = tree.root_node();
                let src = self.text.as_bytes();
                match language {
                    Language::Python => python::collect(root, src, &mut out),
                    Language::Rust => rust::collect(root, src, &mut out),
                    _ => javascript::collect(root, src, &mut out),
                }
            }
        }
        out
    }

    fn parse(&self) -> Option<Tree> {
        let grammar = match self.language {
            Language::TypeScript if is_tsx(&self.origin) => {
                tree_sitter_typescript::LANGUAGE_TSX.into()
            }
            language => language.tree_sitter_language()?,
        };

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&grammar) {
            log::warn!("No {} grammar for {}: {}", self.language, self.origin.display(), e);
            return None;
        }
        let tree = parser.parse(self.text, None);
        if tree.is_none() {
            log::warn!("Failed to parse {}", self.origin.display());
        }
        tree
    }

    fn locate(&self, raw: RawSpecifier) -> ImportSpecifier {
        let (line, column) = self.lines.locate(self.text, raw.offset);
        ImportSpecifier {
            raw: raw.raw,
            origin: self.origin.clone(),
            language: self.language,
            line,
            column,
            kind: raw.kind,
        }
    }
}

fn is_tsx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsx"))
}

/// Iterator over the specifiers of a [`SourceScan`]
pub struct Specifiers<'s, 't> {
    scan: &'s SourceScan<'t>,
    found: std::vec::IntoIter<RawSpecifier>,
}

impl Iterator for Specifiers<'_, '_> {
    type Item = ImportSpecifier;

    fn next(&mut self) -> Option<Self::Item> {
        self.found.next().map(|raw| self.scan.locate(raw))
    }
}

/// Pre-order walk over `root`; `visit` returns whether to descend into the
/// node's children.
pub(crate) fn walk<'a>(root: Node<'a>, mut visit: impl FnMut(Node<'a>) -> bool) {
    let mut cursor = root.walk();
    loop {
        if visit(cursor.node()) && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

pub(crate) fn node_text<'s>(node: Node<'_>, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or_default()
}

/// Byte offset -> (line, column), both 1-indexed.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn locate(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let start = self.starts[line];
        let column = text
            .get(start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset.saturating_sub(start));
        (line + 1, column + 1)
    }
}
