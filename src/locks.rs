use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-path async locks.
///
/// Mutating requests hold the guard for their whole sequence so two writers
/// to the same path never interleave, and a reader never sees a fingerprint
/// taken in the middle of a write. Different paths never contend.
#[derive(Debug, Clone, Default)]
pub struct PathLocks {
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, path: &Path) -> PathGuard {
        let mutex = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        PathGuard {
            locks: self.locks.clone(),
            key: path.to_path_buf(),
            guard: Some(guard),
        }
    }

    /// Number of paths with a live lock entry.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held lock on one path. The registry entry is dropped with the last guard.
#[derive(Debug)]
pub struct PathGuard {
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
    key: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own reference left means nobody holds or awaits it.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
