use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Request-scoped map from commit hash to the tracked file's content there.
///
/// `Some(None)` from [`ContentCache::get`] records that the file was absent
/// at that commit, so absent commits are not fetched again either.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: Mutex<HashMap<String, Option<Arc<str>>>>,
}

impl ContentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hash: &str) -> Option<Option<Arc<str>>> {
        self.lock().get(hash).cloned()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.lock().contains_key(hash)
    }

    pub fn insert(&self, hash: impl Into<String>, content: Option<Arc<str>>) {
        self.lock().insert(hash.into(), content);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<Arc<str>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
