use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source language of a traced file.
///
/// The set is closed: every variant carries its own extraction and resolution
/// rules, selected with a `match` rather than through trait objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Rust,
    C,
    Cpp,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" | "pyi" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "rs" => Language::Rust,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" | "ipp" => Language::Cpp,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Detect language from a shebang line (`#!/usr/bin/env python3`).
    pub fn from_shebang(text: &str) -> Self {
        let Some(first) = text.lines().next() else {
            return Language::Unknown;
        };
        let Some(command) = first.strip_prefix("#!") else {
            return Language::Unknown;
        };

        let mut words = command.split_whitespace();
        let mut interpreter = words.next().unwrap_or_default();
        if interpreter.ends_with("/env") {
            interpreter = words.find(|w| !w.starts_with('-')).unwrap_or_default();
        }
        let name = interpreter.rsplit('/').next().unwrap_or(interpreter);

        if name.starts_with("python") {
            Language::Python
        } else if name == "node" || name == "nodejs" || name == "deno" || name == "bun" {
            Language::JavaScript
        } else if name == "ts-node" || name == "tsx" {
            Language::TypeScript
        } else {
            Language::Unknown
        }
    }

    /// Path first, content sniffing as fallback.
    pub fn detect(path: impl AsRef<Path>, text: &str) -> Self {
        match Self::from_path(path) {
            Language::Unknown => Self::from_shebang(text),
            known => known,
        }
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Unknown => "unknown",
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// Extensions tried, in priority order, when a specifier names a file
    /// without one.
    pub fn implicit_extensions(self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyw", "pyi"],
            Language::JavaScript => &["js", "mjs", "cjs", "jsx", "json"],
            Language::TypeScript => &["ts", "tsx", "d.ts", "js", "jsx", "json"],
            Language::Rust => &["rs"],
            // Includes always spell out the file name.
            Language::C | Language::Cpp | Language::Unknown => &[],
        }
    }

    /// File stems that make a directory importable as a module.
    pub fn index_stems(self) -> &'static [&'static str] {
        match self {
            Language::Python => &["__init__"],
            Language::JavaScript | Language::TypeScript => &["index"],
            Language::Rust => &["mod"],
            Language::C | Language::Cpp | Language::Unknown => &[],
        }
    }

    /// Get Tree-sitter language instance; `None` for the include-based
    /// languages, which are scanned line by line.
    pub fn tree_sitter_language(self) -> Option<tree_sitter::Language> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::C | Language::Cpp | Language::Unknown => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
