//! Last successfully assembled dialplan.
//!
//! Readers get a cheap clone of the current text; a refresh replaces it in
//! one swap so no reader ever sees a half-written dialplan.

use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Clone)]
pub struct CompiledCache {
    inner: Arc<RwLock<Arc<str>>>,
}

impl CompiledCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::from(""))),
        }
    }

    /// Current cached dialplan (empty before the first successful refresh)
    pub fn get(&self) -> Arc<str> {
        self.inner.read().clone()
    }

    /// Replace the cached dialplan
    pub fn set(&self, dialplan: impl Into<Arc<str>>) {
        let dialplan = dialplan.into();
        *self.inner.write() = dialplan;
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Default for CompiledCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompiledCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledCache")
            .field("bytes", &self.inner.read().len())
            .finish()
    }
}
