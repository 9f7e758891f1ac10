use std::path::{Path, PathBuf};

use quay_store::StoredObject;
use quay_types::ObjectId;
use tracing::{debug, warn};

use crate::error::PackResult;
use crate::indexer::PackIndexer;
use crate::reader::PackReader;

/// Manages the pack files of one repository.
pub struct PackManager {
    pack_dir: PathBuf,
    packs: Vec<PackReader>,
}

impl PackManager {
    /// Load every pack under `<repo_root>/objects/pack`.
    ///
    /// Packs that fail to open are skipped with a warning.
    pub fn load(repo_root: &Path) -> PackResult<Self> {
        let mut manager = Self {
            pack_dir: repo_root.join("objects").join("pack"),
            packs: Vec::new(),
        };
        manager.refresh()?;
        Ok(manager)
    }

    /// An empty manager with no backing directory.
    pub fn empty() -> Self {
        Self {
            pack_dir: PathBuf::new(),
            packs: Vec::new(),
        }
    }

    pub fn pack_dir(&self) -> &Path {
        &self.pack_dir
    }

    /// Open packs that appeared since the last scan. Returns how many were added.
    pub fn refresh(&mut self) -> PackResult<usize> {
        if self.pack_dir.as_os_str().is_empty() || !self.pack_dir.exists() {
            return Ok(0);
        }

        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(&self.pack_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "pack") && !self.is_loaded(&path) {
                candidates.push(path);
            }
        }
        candidates.sort();

        let mut added = 0;
        for path in candidates {
            match PackReader::open(&path) {
                Ok(reader) => {
                    debug!(pack = %path.display(), objects = reader.object_count(), "pack loaded");
                    self.packs.push(reader);
                    added += 1;
                }
                Err(e) => {
                    warn!(pack = %path.display(), error = %e, "skipping corrupt pack");
                }
            }
        }
        Ok(added)
    }

    fn is_loaded(&self, path: &Path) -> bool {
        self.packs.iter().any(|p| p.path() == Some(path))
    }

    /// Start ingesting a new pack into this manager's directory.
    pub fn indexer(&self) -> PackIndexer {
        PackIndexer::new(&self.pack_dir)
    }

    /// Read an object from any loaded pack.
    pub fn read_object(&self, id: &ObjectId) -> PackResult<Option<StoredObject>> {
        for pack in &self.packs {
            if let Some(obj) = pack.read_object(id)? {
                return Ok(Some(obj));
            }
        }
        Ok(None)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.packs.iter().any(|p| p.contains(id))
    }

    pub fn total_objects(&self) -> usize {
        self.packs.iter().map(|p| p.object_count()).sum()
    }

    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }
}

impl std::fmt::Debug for PackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackManager")
            .field("pack_dir", &self.pack_dir)
            .field("packs", &self.packs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::PackWriter;
    use quay_store::Blob;

    fn write_pack(dir: &Path, contents: &[&[u8]]) -> Vec<ObjectId> {
        let mut writer = PackWriter::new();
        let ids = contents
            .iter()
            .map(|c| writer.add_object(&Blob::new(c.to_vec()).to_stored_object()))
            .collect();
        writer.finish(dir).unwrap();
        ids
    }

    #[test]
    fn empty_manager() {
        let mgr = PackManager::empty();
        assert_eq!(mgr.pack_count(), 0);
        assert_eq!(mgr.total_objects(), 0);
        assert!(!mgr.contains(&ObjectId::null()));
        assert!(mgr.read_object(&ObjectId::null()).unwrap().is_none());
    }

    #[test]
    fn load_missing_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let mgr = PackManager::load(root.path()).unwrap();
        assert_eq!(mgr.pack_count(), 0);
        assert_eq!(mgr.pack_dir(), root.path().join("objects/pack"));
    }

    #[test]
    fn load_reads_across_packs() {
        let root = tempfile::tempdir().unwrap();
        let pack_dir = root.path().join("objects/pack");
        let first = write_pack(&pack_dir, &[b"one", b"two"]);
        let second = write_pack(&pack_dir, &[b"three"]);

        let mgr = PackManager::load(root.path()).unwrap();
        assert_eq!(mgr.pack_count(), 2);
        assert_eq!(mgr.total_objects(), 3);
        for id in first.iter().chain(&second) {
            assert!(mgr.read_object(id).unwrap().is_some());
        }
    }

    #[test]
    fn refresh_picks_up_new_packs_once() {
        let root = tempfile::tempdir().unwrap();
        let pack_dir = root.path().join("objects/pack");
        write_pack(&pack_dir, &[b"early"]);
        let mut mgr = PackManager::load(root.path()).unwrap();

        let late = write_pack(&pack_dir, &[b"late"]);
        assert!(!mgr.contains(&late[0]));
        assert_eq!(mgr.refresh().unwrap(), 1);
        assert!(mgr.contains(&late[0]));
        assert_eq!(mgr.refresh().unwrap(), 0);
        assert_eq!(mgr.pack_count(), 2);
    }

    #[test]
    fn corrupt_pack_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let pack_dir = root.path().join("objects/pack");
        let good = write_pack(&pack_dir, &[b"good"]);
        std::fs::write(pack_dir.join("pack-bad.pack"), b"garbage").unwrap();
        std::fs::write(pack_dir.join("pack-bad.idx"), b"garbage").unwrap();

        let mgr = PackManager::load(root.path()).unwrap();
        assert_eq!(mgr.pack_count(), 1);
        assert!(mgr.contains(&good[0]));
    }
}
