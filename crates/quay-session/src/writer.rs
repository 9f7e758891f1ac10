//! The write side: stage, commit, and flush.

use std::path::Path;
use std::sync::Arc;

use quay_index::Index;
use quay_pack::IndexerProgress;
use quay_store::{Blob, InMemoryObjectStore, ObjectStore};
use quay_types::ObjectId;
use tracing::{debug, info, instrument, warn};

use crate::error::SessionResult;
use crate::session::{open_repository, ObjectSession, SessionCore, SessionMode};

/// Message used when a commit is made without one.
fn default_message() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Stages writes against one branch and turns them into commits.
///
/// New objects (blobs, trees, commits) accumulate in an in-memory buffer and
/// only reach disk on [`flush_pack`](Self::flush_pack), as a single pack. The
/// on-disk branch ref moves at the same time, so a ref never names an object
/// that has not been packed.
///
/// Dropping a writer discards anything not yet flushed.
pub struct WriterSession {
    core: SessionCore,
    index: Index,
    mempack: Arc<InMemoryObjectStore>,
    /// Root tree of the current head commit.
    head_tree: ObjectId,
    /// Commit the on-disk ref points at. `None` until a newly created branch
    /// is first flushed.
    durable_head: Option<ObjectId>,
}

impl WriterSession {
    /// Open `branch` for writing, creating the repository and the branch if
    /// needed. A new branch starts from an empty root commit.
    pub fn open(location: impl AsRef<Path>, branch: &str) -> SessionResult<Self> {
        let repo = open_repository(location.as_ref(), branch)?;
        let mempack = repo.attach_mempack(repo.config().pack.mempack_priority);

        let (head, durable_head) = match repo.lookup_branch(branch)? {
            Some(head) => (head, Some(head)),
            None => {
                let initial = repo.create_initial_commit(None)?;
                debug!(branch, commit = %initial.short_hex(), "created branch");
                (initial, None)
            }
        };

        let store: Arc<dyn ObjectStore> = repo.odb().clone();
        let core = SessionCore::new(repo, branch, head);
        let head_tree = core.commit_tree(&head)?;
        let mut index = Index::new(store);
        index.read_tree(&head_tree)?;

        debug!(branch, head = %head.short_hex(), files = index.len(), "writer opened");
        Ok(Self {
            core,
            index,
            mempack,
            head_tree,
            durable_head,
        })
    }

    /// Stage `data` at `path` unless the same content is already staged there.
    ///
    /// Returns `true` if the staged content changed. Identical content is
    /// detected by blob id and writes nothing.
    pub fn write_checked(&mut self, path: &str, data: &[u8]) -> SessionResult<bool> {
        if let Some(entry) = self.index.find(path) {
            if entry.object_id == Blob::id_for(data) {
                return Ok(false);
            }
        }
        self.index.add_from_buffer(path, data)?;
        Ok(true)
    }

    /// Stage `data` at `path` without looking at what is staged there now.
    pub fn write_unchecked(&mut self, path: &str, data: &[u8]) -> SessionResult<()> {
        self.index.add_from_buffer(path, data)?;
        Ok(())
    }

    /// Unstage `path` so the next commit deletes it. Returns `false` if
    /// nothing was staged there.
    pub fn remove_file(&mut self, path: &str) -> SessionResult<bool> {
        Ok(self.index.remove(path).is_some())
    }

    /// Commit the staged files.
    ///
    /// Returns `false`, creating nothing, when the staged tree equals the
    /// head's tree. The new commit is not durable until
    /// [`flush_pack`](Self::flush_pack).
    #[instrument(skip(self, message), fields(branch = %self.core.branch()))]
    pub fn commit(&mut self, message: Option<&str>) -> SessionResult<bool> {
        let tree = self.index.write_tree()?;
        if tree == self.head_tree {
            debug!("nothing to commit");
            return Ok(false);
        }

        let message = message.map_or_else(default_message, str::to_string);
        let repo = self.core.repository();
        let parent = self.core.commit_id();
        let commit = repo.create_commit(&message, &repo.default_signature(), &[parent], tree, None)?;

        self.index.clear();
        self.index.read_tree(&tree)?;
        self.core.set_commit_id(commit);
        self.head_tree = tree;

        debug!(commit = %commit.short_hex(), tree = %tree.short_hex(), "committed");
        Ok(true)
    }

    /// Write every pending object as one pack, then move the branch ref to
    /// the session head.
    ///
    /// With nothing pending no pack is written.
    #[instrument(skip(self), fields(branch = %self.core.branch()))]
    pub fn flush_pack(&mut self) -> SessionResult<()> {
        let repo = self.core.repository();
        if !self.mempack.is_empty() {
            let bytes = repo.dump_pending_objects(&self.mempack)?;
            let mut progress = IndexerProgress::default();
            let mut indexer = repo.indexer();
            indexer.append(&bytes, &mut progress)?;
            let pack = indexer.commit(&mut progress)?;
            repo.refresh_packs()?;
            self.mempack.clear();
            info!(
                pack = %pack.name(),
                objects = progress.indexed_objects,
                bytes = progress.received_bytes,
                "flushed pending objects"
            );
        }

        let head = self.core.commit_id();
        if self.durable_head != Some(head) {
            repo.set_branch(self.core.branch(), head)?;
            self.durable_head = Some(head);
        }
        Ok(())
    }

    /// Commit, and flush only if a commit was created.
    pub fn commit_and_flush(&mut self, message: Option<&str>) -> SessionResult<bool> {
        let created = self.commit(message)?;
        if created {
            self.flush_pack()?;
        }
        Ok(created)
    }

    /// Objects waiting for the next flush.
    pub fn pending_object_count(&self) -> usize {
        self.mempack.len()
    }

    /// Whether the session head is ahead of the on-disk branch ref.
    pub fn has_unflushed_commits(&self) -> bool {
        self.durable_head != Some(self.core.commit_id())
    }

    /// Number of staged files.
    pub fn staged_len(&self) -> usize {
        self.index.len()
    }
}

impl ObjectSession for WriterSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn mode(&self) -> SessionMode {
        SessionMode::Writer
    }

    /// Reads the staging index, so uncommitted writes are visible.
    fn read_file(&self, path: &str) -> SessionResult<Option<Vec<u8>>> {
        match self.index.find(path) {
            Some(entry) => Ok(Some(self.core.repository().read_blob(&entry.object_id)?)),
            None => Ok(None),
        }
    }

    fn file_exists(&self, path: &str) -> SessionResult<bool> {
        Ok(self.index.find(path).is_some())
    }
}

impl Drop for WriterSession {
    fn drop(&mut self) {
        if self.has_unflushed_commits() {
            warn!(
                branch = %self.core.branch(),
                head = %self.core.commit_id().short_hex(),
                pending = self.mempack.len(),
                "writer dropped with unflushed commits"
            );
        }
    }
}

impl std::fmt::Debug for WriterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSession")
            .field("core", &self.core)
            .field("staged", &self.index.len())
            .field("pending", &self.mempack.len())
            .finish()
    }
}
