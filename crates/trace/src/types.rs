use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// How an import specifier is written, which decides how it is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecifierKind {
    /// `./x`, `../x`, `.mod`, `crate::x`, `"x.h"`: anchored at the referencing file
    RelativePath,

    /// `a.b.c` module paths searched under the project roots
    DottedModule,

    /// Bare package names (`lodash`, `@scope/pkg`, `serde::Value`)
    PackageQualified,

    /// `from .. import name`: a submodule of the package, or a name the
    /// package itself defines
    ImportedName,

    /// Rust `mod x;`
    ModuleDeclaration,

    /// C/C++ `#include <x>`
    SystemInclude,
}

/// One import/include/require target as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    /// Literal specifier text (`./c`, `src.models.user`, `crate::a::B`)
    pub raw: String,

    /// File the specifier was found in
    pub origin: PathBuf,

    /// Language of the origin file
    pub language: Language,

    /// Line (1-indexed)
    pub line: usize,

    /// Column (1-indexed, in characters)
    pub column: usize,

    pub kind: SpecifierKind,
}

/// Why a file or an edge was not followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// File is not valid UTF-8
    Undecodable,

    /// Target lies beyond `max_depth`
    DepthLimit,

    /// Run budget ran out before the file was visited
    BudgetExceeded,

    /// Standard library, system header or third-party package
    External,

    /// Target resolved outside every project root
    OutsideRoots,

    /// No extraction rules for the file's language
    UnsupportedLanguage,

    /// File could not be read
    Unreadable,

    /// File exceeds `max_file_bytes`
    TooLarge,

    /// Worker task panicked while visiting the file
    WorkerFailed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Undecodable => "undecodable",
            SkipReason::DepthLimit => "depth-limit",
            SkipReason::BudgetExceeded => "budget-exceeded",
            SkipReason::External => "external",
            SkipReason::OutsideRoots => "outside-roots",
            SkipReason::UnsupportedLanguage => "unsupported-language",
            SkipReason::Unreadable => "unreadable",
            SkipReason::TooLarge => "too-large",
            SkipReason::WorkerFailed => "worker-failed",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum EdgeOutcome {
    Resolved,

    NotFound,

    /// Several project roots matched; the first candidate was chosen
    Ambiguous { candidates: Vec<PathBuf> },

    Skipped { reason: SkipReason },
}

impl EdgeOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// Outcomes whose target is followed by the traversal
    pub fn is_followable(&self) -> bool {
        matches!(self, EdgeOutcome::Resolved | EdgeOutcome::Ambiguous { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            EdgeOutcome::Resolved => "resolved",
            EdgeOutcome::NotFound => "not-found",
            EdgeOutcome::Ambiguous { .. } => "ambiguous",
            EdgeOutcome::Skipped { reason } => reason.as_str(),
        }
    }
}

/// Position of an edge in the normalized log order:
/// depth of the referencing file, then its discovery sequence, then the
/// specifier's position inside that file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from_depth: usize,
    pub from_seq: u64,
    pub ordinal: usize,
}

/// One specifier's resolution, linking a referencing file to a resolved file
/// or to a failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEdge {
    pub specifier: ImportSpecifier,

    /// Resolved file (canonical), if any
    pub to: Option<PathBuf>,

    pub outcome: EdgeOutcome,

    pub key: EdgeKey,
}

impl ResolutionEdge {
    pub fn new(specifier: ImportSpecifier, to: Option<PathBuf>, outcome: EdgeOutcome) -> Self {
        Self {
            specifier,
            to,
            outcome,
            key: EdgeKey::default(),
        }
    }

    pub fn resolved(specifier: ImportSpecifier, to: PathBuf) -> Self {
        Self::new(specifier, Some(to), EdgeOutcome::Resolved)
    }

    pub fn not_found(specifier: ImportSpecifier) -> Self {
        Self::new(specifier, None, EdgeOutcome::NotFound)
    }

    pub fn skipped(specifier: ImportSpecifier, to: Option<PathBuf>, reason: SkipReason) -> Self {
        Self::new(specifier, to, EdgeOutcome::skipped(reason))
    }

    /// Referencing file
    pub fn from(&self) -> &Path {
        &self.specifier.origin
    }
}

/// A file entering the `Visiting` state. At most one per path and run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub path: PathBuf,
    pub depth: usize,
    pub seq: u64,
    pub language: Language,
}

/// A file-level event that kept a file from contributing specifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSkip {
    pub path: PathBuf,
    pub reason: SkipReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// An import leading back to a file on the importer's own discovery path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCycle {
    /// Discovery path from the re-imported file down to the importer; the
    /// closing edge runs from the last file back to the first.
    pub files: Vec<PathBuf>,
    /// Key of the closing edge
    pub edge: EdgeKey,
}

impl ImportCycle {
    /// `a -> b -> a`
    pub fn describe(&self) -> String {
        self.files
            .iter()
            .chain(self.files.first())
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Append-only record of one traversal run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLog {
    edges: Vec<ResolutionEdge>,
    visits: Vec<VisitRecord>,
    file_skips: Vec<FileSkip>,
    #[serde(default)]
    cycles: Vec<ImportCycle>,
}

impl EdgeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_edge(&mut self, edge: ResolutionEdge) {
        self.edges.push(edge);
    }

    pub(crate) fn push_visit(&mut self, visit: VisitRecord) {
        self.visits.push(visit);
    }

    pub(crate) fn push_file_skip(&mut self, skip: FileSkip) {
        self.file_skips.push(skip);
    }

    pub(crate) fn push_cycle(&mut self, cycle: ImportCycle) {
        self.cycles.push(cycle);
    }

    /// Edges in append order
    pub fn edges(&self) -> &[ResolutionEdge] {
        &self.edges
    }

    /// Edges ordered by discovery depth, then first-discovery sequence
    pub fn normalized_edges(&self) -> Vec<&ResolutionEdge> {
        let mut edges: Vec<_> = self.edges.iter().collect();
        edges.sort_by_key(|edge| edge.key);
        edges
    }

    /// `Visiting` transitions in the order they happened
    pub fn visits(&self) -> &[VisitRecord] {
        &self.visits
    }

    pub fn file_skips(&self) -> &[FileSkip] {
        &self.file_skips
    }

    /// Import cycles in the order their closing edges were merged
    pub fn cycles(&self) -> &[ImportCycle] {
        &self.cycles
    }

    /// Edges originating from `path`
    pub fn edges_from<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a ResolutionEdge> {
        self.edges.iter().filter(move |edge| edge.from() == path)
    }
}

/// A file selected for the output bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedFile {
    pub path: PathBuf,
    pub depth: usize,
    pub seq: u64,
    pub seed: bool,
}

/// Deduplicated, ordered set of files for the bundle: seeds first in their
/// original order, then discovered files in breadth-first discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionSet {
    files: Vec<IncludedFile>,
}

impl InclusionSet {
    /// Build from entries; sorts by discovery sequence and drops duplicates.
    pub(crate) fn from_entries(mut files: Vec<IncludedFile>) -> Self {
        files.sort_by_key(|file| file.seq);
        let mut seen = HashSet::new();
        files.retain(|file| seen.insert(file.path.clone()));
        Self { files }
    }

    pub fn files(&self) -> &[IncludedFile] {
        &self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|file| file.path.as_path())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|file| file.path == path)
    }

    pub fn get(&self, path: &Path) -> Option<&IncludedFile> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.files.into_iter().map(|file| file.path).collect()
    }
}

/// Everything one `trace` call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRun {
    pub inclusion: InclusionSet,
    pub log: EdgeLog,
}
