//! Pending thumbnail requests
//!
//! `RequestSet` is the de-duplicated, priority-ordered backlog the loader
//! thread drains from the front. Re-adding a path that is still waiting
//! moves it to the front instead of queueing it twice.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A single pending thumbnail job, identified by its path
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathRequest(Arc<Path>);

impl PathRequest {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for PathRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathRequest({})", self.0.display())
    }
}

impl AsRef<Path> for PathRequest {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for PathRequest {
    fn from(path: PathBuf) -> Self {
        Self(Arc::from(path))
    }
}

impl From<&PathBuf> for PathRequest {
    fn from(path: &PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for PathRequest {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<&str> for PathRequest {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// What `RequestSet::add` did with the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The path was not queued; it now sits at the front
    Added,
    /// The path was already queued and has been moved to the front
    Reprioritized,
}

/// Ordered, duplicate-free collection of pending requests
///
/// Entries are keyed by a sequence number that decreases with every
/// prepend, so the smallest key is always the front. A reverse index
/// lets a repeat request find and move its entry without a scan.
///
/// Not synchronised on its own; the loader keeps it behind one mutex.
#[derive(Debug, Default)]
pub struct RequestSet {
    order: BTreeMap<i64, PathRequest>,
    index: HashMap<PathRequest, i64>,
    next_front: i64,
}

impl RequestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `request` at the front, moving it there if it was already queued
    pub fn add(&mut self, request: PathRequest) -> AddOutcome {
        let key = self.next_front;
        self.next_front -= 1;

        match self.index.insert(request.clone(), key) {
            Some(previous) => {
                self.order.remove(&previous);
                self.order.insert(key, request);
                AddOutcome::Reprioritized
            }
            None => {
                self.order.insert(key, request);
                AddOutcome::Added
            }
        }
    }

    /// Pop the next request to service
    pub fn remove_front(&mut self) -> Option<PathRequest> {
        let (_, request) = self.order.pop_first()?;
        self.index.remove(&request);
        Some(request)
    }

    pub fn front(&self) -> Option<&PathRequest> {
        self.order.values().next()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(&PathRequest::new(path))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Front to back
    pub fn iter(&self) -> impl Iterator<Item = &PathRequest> {
        self.order.values()
    }
}
