//! # Context Trace
//!
//! Import-trace resolution: expand a set of seed files with everything they
//! transitively import, so a context bundle carries its dependencies.
//!
//! ## Features
//!
//! - **Specifier extraction** - tree-sitter import nodes for Python,
//!   JavaScript/TypeScript and Rust, `#include` lines for C/C++
//! - **Module resolution** - language conventions, project roots, path aliases
//! - **Bounded traversal** - breadth-first, depth and budget limits, cycle safe
//! - **Reports** - edge outcomes, import cycles and diagnostics as Markdown or JSON
//!
//! ## Architecture
//!
//! ```text
//! seed files
//!     │
//!     └──> Tracer (breadth-first tiers)
//!            ├─ VisitRegistry: Queued → Visiting → Visited
//!            ├─ SourceScan: text → ImportSpecifier*
//!            ├─ Resolver: specifier → file | not found | skipped
//!            └─ EdgeLog + InclusionSet
//!                   │
//!                   └──> ResolutionReport
//! ```
//!
//! ```no_run
//! use context_trace::{ProjectRoots, ResolutionReport, TraceConfig, Tracer};
//! use std::path::PathBuf;
//!
//! # async fn run() -> context_trace::Result<()> {
//! let roots = ProjectRoots::detect(".")?;
//! let tracer = Tracer::new(TraceConfig::default(), roots)?;
//! let run = tracer.trace(&[PathBuf::from("src/main.py")]).await?;
//! for path in run.inclusion.paths() {
//!     println!("{}", path.display());
//! }
//! println!("{}", ResolutionReport::new(&run).to_markdown());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod extract;
mod language;
mod report;
mod resolve;
mod roots;
mod traverse;
mod types;

pub use config::{PathAlias, TraceConfig};
pub use error::{Result, TraceError};
pub use extract::{SourceScan, Specifiers};
pub use language::Language;
pub use report::{Diagnostic, OutcomeCounts, ResolutionReport};
pub use resolve::Resolver;
pub use roots::{detect_project_root, ProjectRoots};
pub use traverse::{Claim, Tracer, VisitRegistry, VisitState};
pub use types::{
    EdgeKey, EdgeLog, EdgeOutcome, FileSkip, ImportCycle, ImportSpecifier, IncludedFile,
    InclusionSet, ResolutionEdge, SkipReason, SpecifierKind, TraceRun, VisitRecord,
};
