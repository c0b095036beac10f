//! Breadth-first traversal over resolved imports.
//!
//! Tiers are processed in depth order; files inside a tier are read, scanned
//! and resolved on blocking workers, and their results are merged back in
//! queue order. Claims, sequence numbers and the edge log therefore do not
//! depend on which worker finishes first.

mod registry;

pub use registry::{Claim, VisitRegistry, VisitState};

use crate::config::TraceConfig;
use crate::error::{Result, TraceError};
use crate::extract::SourceScan;
use crate::language::Language;
use crate::resolve::Resolver;
use crate::roots::ProjectRoots;
use crate::types::{
    EdgeKey, EdgeLog, EdgeOutcome, FileSkip, ImportCycle, IncludedFile, InclusionSet,
    ResolutionEdge, SkipReason, TraceRun, VisitRecord,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A claimed file waiting for its visit.
#[derive(Debug, Clone)]
struct Pending {
    path: PathBuf,
    depth: usize,
    seq: u64,
}

/// Mutable state of one `trace` call.
#[derive(Debug, Default)]
struct RunState {
    log: EdgeLog,
    included: Vec<IncludedFile>,
    /// Discoverer of each non-seed file
    parents: HashMap<PathBuf, PathBuf>,
}

/// What a worker produced for one file.
#[derive(Debug)]
enum FileVisit {
    Scanned {
        language: Language,
        edges: Vec<ResolutionEdge>,
    },
    Skipped {
        language: Language,
        reason: SkipReason,
        detail: Option<String>,
    },
    /// Another worker already owns the file
    Duplicate,
}

/// Import-trace engine: seeds in, inclusion set and edge log out.
pub struct Tracer {
    config: TraceConfig,
    resolver: Arc<Resolver>,
}

impl Tracer {
    pub fn new(config: TraceConfig, roots: ProjectRoots) -> Result<Self> {
        config.validate()?;
        let resolver = Resolver::new(roots, &config)?;
        Ok(Self {
            config,
            resolver: Arc::new(resolver),
        })
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Trace from `seeds`. Fails only on setup errors (missing seed); every
    /// per-file problem is recorded in the returned log.
    pub async fn trace(&self, seeds: &[PathBuf]) -> Result<TraceRun> {
        let started = Instant::now();
        let deadline = self.config.time_budget().map(|budget| started + budget);
        let seeds = canonical_seeds(seeds)?;

        let registry = Arc::new(VisitRegistry::new());
        let mut state = RunState::default();
        let mut frontier = Vec::new();

        for seed in seeds {
            if let Claim::New { seq } = registry.claim(&seed, 0) {
                state.included.push(IncludedFile {
                    path: seed.clone(),
                    depth: 0,
                    seq,
                    seed: true,
                });
                frontier.push(Pending {
                    path: seed,
                    depth: 0,
                    seq,
                });
            }
        }

        let mut started_visits = 0usize;
        while !frontier.is_empty() {
            let mut next = Vec::new();
            let mut cursor = 0;

            while cursor < frontier.len() && !self.budget_exhausted(started_visits, deadline) {
                let mut tasks = Vec::with_capacity(self.config.concurrency);
                while tasks.len() < self.config.concurrency
                    && cursor < frontier.len()
                    && !self.budget_exhausted(started_visits, deadline)
                {
                    let pending = frontier[cursor].clone();
                    cursor += 1;
                    started_visits += 1;

                    let registry = Arc::clone(&registry);
                    let resolver = Arc::clone(&self.resolver);
                    let max_bytes = self.config.max_file_bytes;
                    let path = pending.path.clone();
                    let task = tokio::task::spawn_blocking(move || {
                        visit_file(&path, &registry, &resolver, max_bytes)
                    });
                    tasks.push((pending, task));
                }

                for (pending, task) in tasks {
                    let visit = match task.await {
                        Ok(visit) => visit,
                        Err(e) => FileVisit::Skipped {
                            language: Language::from_path(&pending.path),
                            reason: SkipReason::WorkerFailed,
                            detail: Some(format!("Task panicked: {e}")),
                        },
                    };
                    self.merge_visit(&registry, &mut state, &mut next, pending, visit);
                }
            }

            if cursor < frontier.len() {
                let abandoned: Vec<&Pending> = frontier[cursor..].iter().chain(next.iter()).collect();
                log::warn!(
                    "Trace budget exhausted after {} visits; {} queued files not visited",
                    started_visits,
                    abandoned.len()
                );
                for pending in abandoned {
                    registry.abandon(&pending.path);
                    state.log.push_file_skip(FileSkip {
                        path: pending.path.clone(),
                        reason: SkipReason::BudgetExceeded,
                        detail: None,
                    });
                }
                break;
            }
            frontier = next;
        }

        let RunState { log, included, .. } = state;
        let inclusion = InclusionSet::from_entries(included);
        log::info!(
            "Traced {} files ({} visited, {} edges, {} cycles) in {:.2?}",
            inclusion.len(),
            log.visits().len(),
            log.edges().len(),
            log.cycles().len(),
            started.elapsed()
        );
        Ok(TraceRun { inclusion, log })
    }

    fn budget_exhausted(&self, started_visits: usize, deadline: Option<Instant>) -> bool {
        if self
            .config
            .max_files
            .is_some_and(|max| started_visits >= max)
        {
            return true;
        }
        deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fold one worker result into the run, in queue order.
    fn merge_visit(
        &self,
        registry: &VisitRegistry,
        state: &mut RunState,
        next: &mut Vec<Pending>,
        pending: Pending,
        visit: FileVisit,
    ) {
        let (language, edges) = match visit {
            FileVisit::Duplicate => return,
            FileVisit::Scanned { language, edges } => (language, edges),
            FileVisit::Skipped {
                language,
                reason,
                detail,
            } => {
                log::debug!("Skipping {}: {reason}", pending.path.display());
                state.log.push_file_skip(FileSkip {
                    path: pending.path.clone(),
                    reason,
                    detail,
                });
                (language, Vec::new())
            }
        };

        registry.finish_visit(&pending.path);
        state.log.push_visit(VisitRecord {
            path: pending.path.clone(),
            depth: pending.depth,
            seq: pending.seq,
            language,
        });
        if pending.depth > 0 {
            state.included.push(IncludedFile {
                path: pending.path.clone(),
                depth: pending.depth,
                seq: pending.seq,
                seed: false,
            });
        }

        let child_depth = pending.depth + 1;
        for (ordinal, mut edge) in edges.into_iter().enumerate() {
            edge.key = EdgeKey {
                from_depth: pending.depth,
                from_seq: pending.seq,
                ordinal,
            };

            let target = edge.to.clone().filter(|_| edge.outcome.is_followable());
            if let Some(target) = target {
                let over_depth = self.config.max_depth.is_some_and(|max| child_depth > max);
                if over_depth && !registry.contains(&target) {
                    edge.outcome = EdgeOutcome::skipped(SkipReason::DepthLimit);
                } else {
                    match registry.claim(&target, child_depth) {
                        Claim::New { seq } => {
                            state.parents.insert(target.clone(), pending.path.clone());
                            next.push(Pending {
                                path: target,
                                depth: child_depth,
                                seq,
                            });
                        }
                        Claim::Known {
                            state: VisitState::Visiting | VisitState::Visited,
                            ..
                        } => {
                            if let Some(files) = cycle_path(&state.parents, &pending.path, &target) {
                                let cycle = ImportCycle {
                                    files,
                                    edge: edge.key,
                                };
                                log::warn!("Import cycle: {}", cycle.describe());
                                state.log.push_cycle(cycle);
                            }
                        }
                        Claim::Known { .. } => {}
                    }
                }
            }

            log::debug!(
                "{}:{} `{}` -> {}",
                edge.from().display(),
                edge.specifier.line,
                edge.specifier.raw,
                edge.outcome.label()
            );
            state.log.push_edge(edge);
        }
    }
}

/// Discovery path from `target` down to `from` when `target` is `from`
/// itself or one of its discoverers.
fn cycle_path(
    parents: &HashMap<PathBuf, PathBuf>,
    from: &Path,
    target: &Path,
) -> Option<Vec<PathBuf>> {
    let mut chain = vec![from.to_path_buf()];
    let mut current = from;
    while current != target {
        current = parents.get(current)?.as_path();
        chain.push(current.to_path_buf());
    }
    chain.reverse();
    Some(chain)
}

/// Read, decode, scan and resolve one file. Runs on a blocking worker.
fn visit_file(
    path: &Path,
    registry: &VisitRegistry,
    resolver: &Resolver,
    max_bytes: u64,
) -> FileVisit {
    if !registry.begin_visit(path) {
        return FileVisit::Duplicate;
    }

    let by_extension = Language::from_path(path);
    let skipped = |reason, detail: Option<String>| FileVisit::Skipped {
        language: by_extension,
        reason,
        detail,
    };

    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => return skipped(SkipReason::Unreadable, Some(e.to_string())),
    };
    if size > max_bytes {
        return skipped(
            SkipReason::TooLarge,
            Some(format!("{size} bytes exceeds {max_bytes}")),
        );
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return skipped(SkipReason::Unreadable, Some(e.to_string())),
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => return skipped(SkipReason::Undecodable, Some(e.utf8_error().to_string())),
    };

    let language = Language::detect(path, &text);
    if !language.is_supported() {
        return FileVisit::Skipped {
            language,
            reason: SkipReason::UnsupportedLanguage,
            detail: None,
        };
    }

    let scan = SourceScan::new(path, language, &text);
    let edges = scan
        .specifiers()
        .map(|specifier| resolver.resolve(&specifier))
        .collect();
    FileVisit::Scanned { language, edges }
}

/// Canonicalize and de-duplicate seeds, keeping first occurrence order.
fn canonical_seeds(seeds: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut canonical: Vec<PathBuf> = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let path = seed
            .canonicalize()
            .map_err(|e| TraceError::invalid_seed(seed, e.to_string()))?;
        if !path.is_file() {
            return Err(TraceError::invalid_seed(seed, "not a regular file"));
        }
        if !canonical.contains(&path) {
            canonical.push(path);
        }
    }
    Ok(canonical)
}
