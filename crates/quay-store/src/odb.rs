//! Object database: one logical store over several prioritised backends.
//!
//! A repository's packs are attached as a read-only backend; a writer session
//! attaches its in-memory buffer at a higher priority so every new object
//! lands there while reads still fall through to the packs.

use std::sync::{Arc, RwLock};

use quay_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

struct Backend {
    priority: i32,
    store: Arc<dyn ObjectStore>,
}

/// Routes object reads and writes across prioritised backends.
///
/// - Reads try backends from highest to lowest priority and return the first
///   hit.
/// - Writes go to the highest-priority backend that is not read-only. With no
///   writable backend attached, writes fail with [`StoreError::ReadOnly`].
/// - An object any backend already holds is not written again.
///
/// Backends with equal priority keep their attachment order.
pub struct ObjectDatabase {
    backends: RwLock<Vec<Backend>>,
}

impl ObjectDatabase {
    pub fn new() -> Self {
        Self {
            backends: RwLock::new(Vec::new()),
        }
    }

    /// Attach a backend at the given priority.
    pub fn add_backend(&self, store: Arc<dyn ObjectStore>, priority: i32) {
        let mut backends = self.backends.write().expect("lock poisoned");
        let pos = backends
            .iter()
            .position(|b| b.priority < priority)
            .unwrap_or(backends.len());
        backends.insert(pos, Backend { priority, store });
        debug!(priority, backends = backends.len(), "attached object backend");
    }

    pub fn backend_count(&self) -> usize {
        self.backends.read().expect("lock poisoned").len()
    }

    /// Whether any attached backend accepts writes.
    pub fn is_writable(&self) -> bool {
        self.backends
            .read()
            .expect("lock poisoned")
            .iter()
            .any(|b| !b.store.is_read_only())
    }
}

impl Default for ObjectDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for ObjectDatabase {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let backends = self.backends.read().expect("lock poisoned");
        for backend in backends.iter() {
            if let Some(obj) = backend.store.read(id)? {
                return Ok(Some(obj));
            }
        }
        Ok(None)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let backends = self.backends.read().expect("lock poisoned");
        let id = object.compute_id();
        for backend in backends.iter() {
            if backend.store.exists(&id)? {
                return Ok(id);
            }
        }
        let target = backends
            .iter()
            .find(|b| !b.store.is_read_only())
            .ok_or(StoreError::ReadOnly)?;
        target.store.write(object)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let backends = self.backends.read().expect("lock poisoned");
        for backend in backends.iter() {
            if backend.store.exists(id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn is_read_only(&self) -> bool {
        !self.is_writable()
    }
}

impl std::fmt::Debug for ObjectDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backends = self.backends.read().expect("lock poisoned");
        let priorities: Vec<i32> = backends.iter().map(|b| b.priority).collect();
        f.debug_struct("ObjectDatabase")
            .field("priorities", &priorities)
            .finish()
    }
}
