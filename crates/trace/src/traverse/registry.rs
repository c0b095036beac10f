use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Lifecycle of a file within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    Queued,
    Visiting,
    Visited,
    /// Left in the frontier when the budget ran out
    Abandoned,
}

/// Result of [`VisitRegistry::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First sighting; the file is now `Queued` with this sequence number
    New { seq: u64 },
    /// Already claimed at `depth`
    Known { depth: usize, state: VisitState },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: VisitState,
    depth: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<PathBuf, Entry>,
    next_seq: u64,
}

/// Visit state of every file seen in a run, keyed by canonical path.
///
/// All transitions go through one lock, so check-and-enqueue and the move
/// into `Visiting` are atomic with respect to concurrent workers.
#[derive(Debug, Default)]
pub struct VisitRegistry {
    inner: Mutex<Inner>,
}

impl VisitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every transition is a single map write; a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue `path` at `depth` unless it was seen before.
    pub fn claim(&self, path: &Path, depth: usize) -> Claim {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get(path) {
            return Claim::Known {
                depth: entry.depth,
                state: entry.state,
            };
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            path.to_path_buf(),
            Entry {
                state: VisitState::Queued,
                depth,
            },
        );
        Claim::New { seq }
    }

    /// `Queued -> Visiting`. Returns false for any other state, so each file
    /// is visited at most once.
    pub fn begin_visit(&self, path: &Path) -> bool {
        self.transition(path, VisitState::Queued, VisitState::Visiting)
    }

    /// `Visiting -> Visited`
    pub fn finish_visit(&self, path: &Path) -> bool {
        self.transition(path, VisitState::Visiting, VisitState::Visited)
    }

    /// `Queued -> Abandoned`
    pub fn abandon(&self, path: &Path) -> bool {
        self.transition(path, VisitState::Queued, VisitState::Abandoned)
    }

    pub fn state(&self, path: &Path) -> Option<VisitState> {
        self.lock().entries.get(path).map(|entry| entry.state)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn transition(&self, path: &Path, from: VisitState, to: VisitState) -> bool {
        let mut inner = self.lock();
        match inner.entries.get_mut(path) {
            Some(entry) if entry.state == from => {
                entry.state = to;
                true
            }
            _ => false,
        }
    }
}
