//! Object-store views over packs.

use std::path::Path;
use std::sync::RwLock;

use quay_store::{InMemoryObjectStore, ObjectStore, StoreError, StoreResult, StoredObject};
use quay_types::ObjectId;

use crate::error::PackResult;
use crate::manager::PackManager;
use crate::writer::PackWriter;

/// Read-only [`ObjectStore`] over every pack in a repository.
///
/// Attached to an object database as the durable, lowest-priority backend.
/// Call [`PackedObjectStore::refresh`] after writing a pack to make its
/// objects visible.
pub struct PackedObjectStore {
    manager: RwLock<PackManager>,
}

impl PackedObjectStore {
    pub fn load(repo_root: &Path) -> PackResult<Self> {
        Ok(Self::new(PackManager::load(repo_root)?))
    }

    pub fn new(manager: PackManager) -> Self {
        Self {
            manager: RwLock::new(manager),
        }
    }

    /// Rescan the pack directory. Returns the number of packs added.
    pub fn refresh(&self) -> PackResult<usize> {
        self.manager.write().expect("lock poisoned").refresh()
    }

    pub fn pack_count(&self) -> usize {
        self.manager.read().expect("lock poisoned").pack_count()
    }

    pub fn total_objects(&self) -> usize {
        self.manager.read().expect("lock poisoned").total_objects()
    }

    /// Start ingesting a new pack into the managed directory.
    pub fn indexer(&self) -> crate::PackIndexer {
        self.manager.read().expect("lock poisoned").indexer()
    }
}

impl ObjectStore for PackedObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let manager = self.manager.read().expect("lock poisoned");
        Ok(manager.read_object(id)?)
    }

    fn write(&self, _object: &StoredObject) -> StoreResult<ObjectId> {
        Err(StoreError::ReadOnly)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.manager.read().expect("lock poisoned").contains(id))
    }

    fn is_read_only(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for PackedObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedObjectStore")
            .field("packs", &self.pack_count())
            .finish()
    }
}

/// Serialize every object buffered in `mempack` as pack bytes.
///
/// Objects are ordered by id so the same buffer always produces the same
/// pack. The buffer itself is left untouched.
pub fn dump_mempack(mempack: &InMemoryObjectStore, compression_level: i32) -> PackResult<Vec<u8>> {
    let mut writer = PackWriter::new().with_compression_level(compression_level);
    for (_, obj) in mempack.snapshot() {
        writer.add_object(&obj);
    }
    Ok(writer.finish_to_bytes()?.0)
}
