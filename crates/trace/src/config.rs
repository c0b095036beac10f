use crate::error::{Result, TraceError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;
const MAX_CONCURRENCY: usize = 64;

/// Configuration for one traversal run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    /// Project roots for non-relative specifiers, in priority order.
    /// Relative entries are taken relative to the config file's directory.
    pub roots: Vec<PathBuf>,

    /// Maximum import depth from the seeds (None = unbounded)
    pub max_depth: Option<usize>,

    /// Maximum number of files visited before the run stops expanding
    pub max_files: Option<usize>,

    /// Wall-clock budget in milliseconds
    pub time_budget_ms: Option<u64>,

    /// Number of files scanned in parallel within a depth tier
    pub concurrency: usize,

    /// Files larger than this are included but not scanned
    pub max_file_bytes: u64,

    /// Do not follow targets that resolve outside every project root
    pub confine_to_roots: bool,

    /// Explicit specifier prefix mappings (`@/` -> `src/`)
    pub aliases: Vec<PathAlias>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: None,
            max_files: None,
            time_budget_ms: None,
            concurrency: default_concurrency(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            confine_to_roots: true,
            aliases: Vec::new(),
        }
    }
}

/// Prefix mapping for bare JavaScript/TypeScript specifiers, the explicit
/// counterpart of tsconfig `paths`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathAlias {
    /// Specifier prefix, e.g. `@/` or `~components/`
    pub prefix: String,

    /// Replacement directories tried in order; relative ones are anchored at
    /// the first project root
    pub targets: Vec<PathBuf>,
}

impl PathAlias {
    pub fn new(prefix: impl Into<String>, targets: Vec<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            targets,
        }
    }

    /// Parse `PREFIX=TARGET` as given on the command line.
    pub fn parse(raw: &str) -> Result<Self> {
        let (prefix, target) = raw
            .split_once('=')
            .ok_or_else(|| TraceError::invalid_config(format!("alias `{raw}` is not PREFIX=TARGET")))?;
        let alias = Self::new(prefix.trim(), vec![PathBuf::from(target.trim())]);
        alias.validate()?;
        Ok(alias)
    }

    fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(TraceError::invalid_config("alias prefix must not be empty"));
        }
        if self.targets.is_empty() {
            return Err(TraceError::invalid_config(format!(
                "alias `{}` has no targets",
                self.prefix
            )));
        }
        Ok(())
    }
}

pub(crate) fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 8)
}

impl TraceConfig {
    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load a TOML config file; relative roots are anchored at its directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw).map_err(|source| TraceError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            for root in &mut config.roots {
                if root.is_relative() {
                    *root = base.join(&*root);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(TraceError::invalid_config("concurrency must be > 0"));
        }
        if self.concurrency > MAX_CONCURRENCY {
            return Err(TraceError::invalid_config(format!(
                "concurrency ({}) cannot exceed {MAX_CONCURRENCY}",
                self.concurrency
            )));
        }
        if self.max_files == Some(0) {
            return Err(TraceError::invalid_config("max_files must be > 0"));
        }
        if self.max_file_bytes == 0 {
            return Err(TraceError::invalid_config("max_file_bytes must be > 0"));
        }
        for alias in &self.aliases {
            alias.validate()?;
        }
        Ok(())
    }
}
