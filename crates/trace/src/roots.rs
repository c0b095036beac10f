use crate::error::{Result, TraceError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Markers that identify a project directory, checked after `.git`.
const PROJECT_MARKERS: &[&str] = &[
    "Cargo.toml",
    "package.json",
    "tsconfig.json",
    "pyproject.toml",
    "setup.py",
];

/// Ordered base directories for non-relative specifiers.
///
/// Order is resolution priority: the first root under which a specifier
/// exists wins. Entries are canonical and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectRoots {
    roots: Vec<PathBuf>,
}

impl ProjectRoots {
    /// Canonicalize and validate roots. A missing root, or one that is not a
    /// directory, is a setup error.
    pub fn new<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let canonical = path
                .canonicalize()
                .map_err(|e| TraceError::invalid_root(path, e.to_string()))?;
            if !canonical.is_dir() {
                return Err(TraceError::invalid_root(path, "not a directory"));
            }
            if !roots.contains(&canonical) {
                roots.push(canonical);
            }
        }
        Ok(Self { roots })
    }

    /// Detect the project root for `start`: nearest ancestor holding `.git`,
    /// then the nearest holding a manifest, else `start` itself.
    pub fn detect(start: impl AsRef<Path>) -> Result<Self> {
        let root = detect_project_root(start.as_ref());
        Self::new([root])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub fn first(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether `path` lies under any root
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

/// Find the project root directory for `start_path`.
///
/// Relative paths (`.`) are resolved first so the search can climb past the
/// working directory.
pub fn detect_project_root(start_path: &Path) -> PathBuf {
    let start_path = absolute(start_path);
    let start_path = start_path.as_path();
    let start_dir = if start_path.is_file() {
        start_path.parent().unwrap_or(start_path)
    } else {
        start_path
    };

    if let Some(git_root) = start_dir
        .ancestors()
        .find(|dir| dir.join(".git").exists())
    {
        return git_root.to_path_buf();
    }

    start_dir
        .ancestors()
        .find(|dir| PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .unwrap_or(start_dir)
        .to_path_buf()
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(path)))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_roots_are_canonical_and_unique() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::create_dir_all(temp.path().join("b")).unwrap();

        let a = temp.path().join("a");
        let roots = ProjectRoots::new([
            a.clone(),
            temp.path().join("b"),
            temp.path().join("b/../a"),
        ])
        .unwrap();

        assert_eq!(roots.len(), 2);
        assert_eq!(roots.first(), Some(a.canonicalize().unwrap().as_path()));
    }

    #[test]
    fn test_missing_root_is_setup_error() {
        let temp = TempDir::new().unwrap();
        let err = ProjectRoots::new([temp.path().join("missing")]).unwrap_err();
        assert!(matches!(err, TraceError::InvalidRoot { .. }));
    }

    #[test]
    fn test_file_root_is_setup_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(ProjectRoots::new([file]).is_err());
    }

    #[test]
    fn test_detect_prefers_git_root() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("pkg/src");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join("pkg/Cargo.toml"), "[package]").unwrap();

        assert_eq!(detect_project_root(&nested), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_detect_climbs_from_relative_start() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("pkg/src");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();

        // Same directory spelled relative to the working directory
        let cwd = std::env::current_dir().unwrap();
        let mut relative: PathBuf = cwd.components().skip(1).map(|_| "..").collect();
        let absolute = nested.canonicalize().unwrap();
        relative.extend(absolute.components().skip(1));
        assert!(relative.is_relative());

        assert_eq!(detect_project_root(&relative), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_detect_falls_back_to_manifest() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("app/src/services");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("app/pyproject.toml"), "").unwrap();
        let file = nested.join("svc.py");
        fs::write(&file, "").unwrap();

        assert_eq!(
            detect_project_root(&file),
            temp.path().join("app").canonicalize().unwrap()
        );
    }
}
