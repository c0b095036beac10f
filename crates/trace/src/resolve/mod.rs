//! Module resolution: import specifier -> file on disk.
//!
//! Each language module turns a specifier into a [`Lookup`] using the probing
//! helpers here; [`Resolver::resolve`] canonicalizes the result and applies
//! root confinement. Resolution only checks the filesystem for existence.

mod c;
mod javascript;
mod python;
mod rust;

use crate::config::{PathAlias, TraceConfig};
use crate::error::{Result, TraceError};
use crate::language::Language;
use crate::roots::ProjectRoots;
use crate::types::{EdgeOutcome, ImportSpecifier, ResolutionEdge, SkipReason};
use std::path::{Path, PathBuf};

/// What a language rule found for one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lookup {
    Found(PathBuf),
    /// Several roots matched; the first entry wins
    Ambiguous(Vec<PathBuf>),
    External,
    NotFound,
}

impl From<Option<PathBuf>> for Lookup {
    fn from(found: Option<PathBuf>) -> Self {
        found.map_or(Lookup::NotFound, Lookup::Found)
    }
}

/// Resolves specifiers against project roots and path aliases.
#[derive(Debug, Clone)]
pub struct Resolver {
    roots: ProjectRoots,
    aliases: Vec<PathAlias>,
    confine_to_roots: bool,
}

impl Resolver {
    /// Build a resolver; relative alias targets are anchored at the first root.
    pub fn new(roots: ProjectRoots, config: &TraceConfig) -> Result<Self> {
        let mut aliases = Vec::with_capacity(config.aliases.len());
        for alias in &config.aliases {
            let mut targets = Vec::with_capacity(alias.targets.len());
            for target in &alias.targets {
                if target.is_absolute() {
                    targets.push(target.clone());
                } else {
                    let base = roots.first().ok_or_else(|| {
                        TraceError::invalid_config(format!(
                            "alias `{}` has a relative target but no project root is set",
                            alias.prefix
                        ))
                    })?;
                    targets.push(base.join(target));
                }
            }
            aliases.push(PathAlias::new(alias.prefix.clone(), targets));
        }

        Ok(Self {
            roots,
            aliases,
            confine_to_roots: config.confine_to_roots,
        })
    }

    pub fn roots(&self) -> &ProjectRoots {
        &self.roots
    }

    /// Resolve one specifier. Never fails: misses are outcomes.
    pub fn resolve(&self, specifier: &ImportSpecifier) -> ResolutionEdge {
        let lookup = match specifier.language {
            Language::Python => python::resolve(self, specifier),
            Language::JavaScript | Language::TypeScript => javascript::resolve(self, specifier),
            Language::Rust => rust::resolve(self, specifier),
            Language::C | Language::Cpp => c::resolve(self, specifier),
            Language::Unknown => Lookup::NotFound,
        };
        self.finish(specifier.clone(), lookup)
    }

    fn finish(&self, specifier: ImportSpecifier, lookup: Lookup) -> ResolutionEdge {
        let (target, outcome) = match lookup {
            Lookup::Found(path) => match path.canonicalize() {
                Ok(path) => (path, EdgeOutcome::Resolved),
                Err(_) => return ResolutionEdge::not_found(specifier),
            },
            Lookup::Ambiguous(candidates) => {
                let candidates: Vec<PathBuf> = candidates
                    .into_iter()
                    .filter_map(|path| path.canonicalize().ok())
                    .collect();
                match candidates.first() {
                    Some(first) => (first.clone(), EdgeOutcome::Ambiguous { candidates }),
                    None => return ResolutionEdge::not_found(specifier),
                }
            }
            Lookup::External => {
                return ResolutionEdge::skipped(specifier, None, SkipReason::External)
            }
            Lookup::NotFound => return ResolutionEdge::not_found(specifier),
        };

        if self.confine_to_roots && !self.roots.is_empty() && !self.roots.contains(&target) {
            return ResolutionEdge::skipped(specifier, Some(target), SkipReason::OutsideRoots);
        }
        ResolutionEdge::new(specifier, Some(target), outcome)
    }

    /// Look up `relative` under every root in order.
    pub(crate) fn search_roots<F>(&self, relative: &Path, locate: F) -> Lookup
    where
        F: Fn(&Path) -> Option<PathBuf>,
    {
        let mut found: Vec<PathBuf> = Vec::new();
        for root in self.roots.iter() {
            let Some(hit) = locate(&root.join(relative)) else {
                continue;
            };
            let canonical = hit.canonicalize().unwrap_or(hit);
            if !found.contains(&canonical) {
                found.push(canonical);
            }
        }

        match found.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(found.remove(0)),
            _ => Lookup::Ambiguous(found),
        }
    }

    /// Apply the first alias whose prefix matches; `None` when no alias
    /// target produced a file.
    pub(crate) fn search_aliases<F>(&self, raw: &str, locate: F) -> Option<PathBuf>
    where
        F: Fn(&Path) -> Option<PathBuf>,
    {
        self.aliases
            .iter()
            .filter_map(|alias| raw.strip_prefix(alias.prefix.as_str()).map(|rest| (alias, rest)))
            .flat_map(|(alias, rest)| {
                let rest = rest.trim_start_matches('/');
                alias.targets.iter().map(move |target| target.join(rest))
            })
            .find_map(|candidate| locate(&candidate))
    }
}

/// Exact file, then `base.<ext>` for each implicit extension, then index
/// files inside `base` if it is a directory.
pub(crate) fn find_file(base: &Path, language: Language) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    find_implicit(base, language)
}

/// Like [`find_file`] without the exact-path attempt. Python checks for a
/// package (`base/__init__.py`) before a module file, as the import system
/// does; the other languages try `base.<ext>` first.
pub(crate) fn find_implicit(base: &Path, language: Language) -> Option<PathBuf> {
    if language == Language::Python {
        find_index(base, language).or_else(|| find_with_extension(base, language))
    } else {
        find_with_extension(base, language).or_else(|| find_index(base, language))
    }
}

fn find_with_extension(base: &Path, language: Language) -> Option<PathBuf> {
    language
        .implicit_extensions()
        .iter()
        .map(|ext| with_appended_extension(base, ext))
        .find(|candidate| candidate.is_file())
}

fn find_index(base: &Path, language: Language) -> Option<PathBuf> {
    if !base.is_dir() {
        return None;
    }
    let extensions = language.implicit_extensions();
    language
        .index_stems()
        .iter()
        .flat_map(|stem| extensions.iter().map(move |ext| base.join(format!("{stem}.{ext}"))))
        .find(|candidate| candidate.is_file())
}

/// `a/b.c` + `ts` -> `a/b.c.ts`; unlike `with_extension` the existing
/// suffix is kept.
fn with_appended_extension(base: &Path, ext: &str) -> PathBuf {
    let mut raw = base.as_os_str().to_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Directory holding `file`, or `file` itself when it has no parent.
pub(crate) fn parent_dir(file: &Path) -> &Path {
    file.parent().unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpecifierKind;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_lookup_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "c.js");
        touch(root, "c.ts");
        touch(root, "pkg/index.ts");

        assert_eq!(
            find_file(&root.join("c"), Language::TypeScript),
            Some(root.join("c.ts"))
        );
        assert_eq!(
            find_file(&root.join("c"), Language::JavaScript),
            Some(root.join("c.js"))
        );
        assert_eq!(
            find_file(&root.join("c.js"), Language::TypeScript),
            Some(root.join("c.js"))
        );
        assert_eq!(
            find_file(&root.join("pkg"), Language::TypeScript),
            Some(root.join("pkg/index.ts"))
        );
        assert_eq!(find_file(&root.join("missing"), Language::TypeScript), None);
    }

    #[test]
    fn test_python_prefers_package_over_module() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "shared.py");
        touch(root, "shared/__init__.py");
        touch(root, "gui.pyw");
        fs::create_dir_all(root.join("loose")).unwrap();
        touch(root, "loose.py");

        assert_eq!(
            find_implicit(&root.join("shared"), Language::Python),
            Some(root.join("shared/__init__.py"))
        );
        assert_eq!(
            find_implicit(&root.join("gui"), Language::Python),
            Some(root.join("gui.pyw"))
        );
        // A directory without `__init__` does not shadow the module file
        assert_eq!(
            find_implicit(&root.join("loose"), Language::Python),
            Some(root.join("loose.py"))
        );
    }

    #[test]
    fn test_appended_extension_keeps_dots() {
        assert_eq!(
            with_appended_extension(Path::new("/a/b.test"), "ts"),
            PathBuf::from("/a/b.test.ts")
        );
    }

    #[test]
    fn test_search_roots_ambiguity() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "one/lib/util.py");
        touch(temp.path(), "two/lib/util.py");
        fs::create_dir_all(temp.path().join("three")).unwrap();

        let roots = ProjectRoots::new([
            temp.path().join("three"),
            temp.path().join("one"),
            temp.path().join("two"),
        ])
        .unwrap();
        let resolver = Resolver::new(roots, &TraceConfig::default()).unwrap();

        let lookup = resolver.search_roots(Path::new("lib/util"), |p| find_file(p, Language::Python));
        match lookup {
            Lookup::Ambiguous(candidates) => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0].ends_with("one/lib/util.py"));
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_outside_roots_is_skipped() {
        let temp = TempDir::new().unwrap();
        let outside = touch(temp.path(), "outside/shared.h");
        let origin = touch(temp.path(), "proj/main.c");
        let roots = ProjectRoots::new([temp.path().join("proj")]).unwrap();
        let resolver = Resolver::new(roots, &TraceConfig::default()).unwrap();

        let spec = ImportSpecifier {
            raw: "../outside/shared.h".to_string(),
            origin: origin.canonicalize().unwrap(),
            language: Language::C,
            line: 1,
            column: 11,
            kind: SpecifierKind::RelativePath,
        };
        let edge = resolver.resolve(&spec);
        assert_eq!(edge.outcome, EdgeOutcome::skipped(SkipReason::OutsideRoots));
        assert_eq!(edge.to, Some(outside.canonicalize().unwrap()));

        let config = TraceConfig {
            confine_to_roots: false,
            ..Default::default()
        };
        let roots = ProjectRoots::new([temp.path().join("proj")]).unwrap();
        let edge = Resolver::new(roots, &config).unwrap().resolve(&spec);
        assert_eq!(edge.outcome, EdgeOutcome::Resolved);
    }

    #[test]
    fn test_relative_alias_without_roots_is_rejected() {
        let config = TraceConfig {
            aliases: vec![PathAlias::new("@/", vec![PathBuf::from("src")])],
            ..Default::default()
        };
        let err = Resolver::new(ProjectRoots::default(), &config).unwrap_err();
        assert!(matches!(err, TraceError::InvalidConfig(_)));
    }
}
