use std::path::{Path, PathBuf};
use std::sync::Arc;

use quay_pack::{dump_mempack, PackIndexer, PackedObjectStore};
use quay_refs::{FileRefStore, RefStore};
use quay_store::{
    Blob, CommitObject, InMemoryObjectStore, ObjectDatabase, ObjectStore, Tree, TreeEntry,
};
use quay_types::{ObjectId, Signature};
use tracing::{debug, info};

use crate::config::RepositoryConfig;
use crate::error::{RepoError, RepoResult};

/// Object-database priority of the pack backend.
pub const PACK_PRIORITY: i32 = 1;

const CONFIG_FILE: &str = "config";
const HEAD_FILE: &str = "HEAD";

/// A bare, pack-only repository directory.
///
/// Layout:
///
/// ```text
/// <path>/config
/// <path>/HEAD
/// <path>/refs/heads/<branch>
/// <path>/objects/pack/pack-<hex>.{pack,idx}
/// ```
///
/// All reads go through one [`ObjectDatabase`]. Packs are attached read-only,
/// so the repository can only create objects once a caller attaches an
/// in-memory buffer with [`Repository::attach_mempack`].
pub struct Repository {
    path: PathBuf,
    config: RepositoryConfig,
    odb: Arc<ObjectDatabase>,
    packs: Arc<PackedObjectStore>,
    refs: FileRefStore,
}

impl Repository {
    /// Create an empty repository at `path`.
    pub fn init(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::init_with_config(path, RepositoryConfig::default())
    }

    pub fn init_with_config(path: impl AsRef<Path>, config: RepositoryConfig) -> RepoResult<Self> {
        let path = path.as_ref();
        if Self::is_repository(path) {
            return Err(RepoError::AlreadyExists(path.to_path_buf()));
        }
        quay_refs::names::validate_branch_name(&config.core.default_branch)?;

        std::fs::create_dir_all(path.join("refs").join("heads"))?;
        std::fs::create_dir_all(path.join("objects").join("pack"))?;
        config.save(&path.join(CONFIG_FILE))?;
        std::fs::write(
            path.join(HEAD_FILE),
            format!("ref: refs/heads/{}\n", config.core.default_branch),
        )?;

        info!(path = %path.display(), branch = %config.core.default_branch, "initialized repository");
        Self::open(path)
    }

    /// Open an existing repository.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        if !Self::is_repository(path) {
            return Err(RepoError::NotARepository(path.to_path_buf()));
        }
        let config = RepositoryConfig::load(&path.join(CONFIG_FILE))?;

        let packs = Arc::new(PackedObjectStore::load(path)?);
        let odb = Arc::new(ObjectDatabase::new());
        odb.add_backend(packs.clone(), PACK_PRIORITY);

        debug!(path = %path.display(), packs = packs.pack_count(), "opened repository");
        Ok(Self {
            path: path.to_path_buf(),
            config,
            odb,
            packs,
            refs: FileRefStore::new(path),
        })
    }

    /// Open the repository at `path`, creating it first if there is none.
    pub fn open_or_init(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        if Self::is_repository(path) {
            Self::open(path)
        } else {
            Self::init(path)
        }
    }

    pub fn is_repository(path: &Path) -> bool {
        path.join(CONFIG_FILE).is_file() && path.join("objects").join("pack").is_dir()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn odb(&self) -> &Arc<ObjectDatabase> {
        &self.odb
    }

    pub fn refs(&self) -> &FileRefStore {
        &self.refs
    }

    /// Author and committer for new commits, stamped now.
    pub fn default_signature(&self) -> Signature {
        Signature::now(&self.config.user.name, &self.config.user.email)
    }

    // ---- Branches ----

    pub fn lookup_branch(&self, name: &str) -> RepoResult<Option<ObjectId>> {
        Ok(self.refs.read_branch(name)?)
    }

    pub fn set_branch(&self, name: &str, target: ObjectId) -> RepoResult<()> {
        self.refs.write_branch(name, target)?;
        debug!(branch = name, target = %target.short_hex(), "branch updated");
        Ok(())
    }

    // ---- Commits ----

    /// Create a parentless commit with an empty tree.
    pub fn create_initial_commit(&self, update_ref: Option<&str>) -> RepoResult<ObjectId> {
        let tree = self.odb.write(&Tree::empty().to_stored_object()?)?;
        self.create_commit("initial commit", &self.default_signature(), &[], tree, update_ref)
    }

    /// Write a commit object, optionally pointing branch `update_ref` at it.
    pub fn create_commit(
        &self,
        message: &str,
        author: &Signature,
        parents: &[ObjectId],
        tree: ObjectId,
        update_ref: Option<&str>,
    ) -> RepoResult<ObjectId> {
        let commit = CommitObject {
            tree,
            parents: parents.to_vec(),
            author: author.clone(),
            committer: author.clone(),
            message: message.to_string(),
        };
        let id = self.odb.write(&commit.to_stored_object()?)?;
        debug!(commit = %id.short_hex(), tree = %tree.short_hex(), parents = parents.len(), "commit created");

        if let Some(branch) = update_ref {
            self.set_branch(branch, id)?;
        }
        Ok(id)
    }

    /// Read a commit. `Ok(None)` when no object has this id; an error when
    /// the object exists but is not a commit.
    pub fn lookup_commit(&self, id: &ObjectId) -> RepoResult<Option<CommitObject>> {
        match self.odb.read(id)? {
            Some(obj) => Ok(Some(CommitObject::from_stored_object(&obj)?)),
            None => Ok(None),
        }
    }

    /// Walk first parents from `start`, newest first, yielding at most
    /// `limit` commits.
    pub fn first_parent_log(
        &self,
        start: ObjectId,
        limit: usize,
    ) -> RepoResult<Vec<(ObjectId, CommitObject)>> {
        let mut log = Vec::new();
        let mut next = Some(start);
        while let Some(id) = next {
            if log.len() >= limit {
                break;
            }
            let commit = self
                .lookup_commit(&id)?
                .ok_or(RepoError::ObjectNotFound(id))?;
            next = commit.first_parent().copied();
            log.push((id, commit));
        }
        Ok(log)
    }

    // ---- Trees and blobs ----

    pub fn read_tree(&self, id: &ObjectId) -> RepoResult<Tree> {
        let obj = self.odb.read(id)?.ok_or(RepoError::ObjectNotFound(*id))?;
        Ok(Tree::from_stored_object(&obj)?)
    }

    pub fn read_blob(&self, id: &ObjectId) -> RepoResult<Vec<u8>> {
        let obj = self.odb.read(id)?.ok_or(RepoError::ObjectNotFound(*id))?;
        Ok(Blob::from_stored_object(obj)?.data)
    }

    /// Resolve a `/`-separated path inside tree `tree_id`.
    ///
    /// Returns `Ok(None)` when any component is missing or an intermediate
    /// component is not a directory.
    pub fn tree_entry_by_path(&self, tree_id: &ObjectId, path: &str) -> RepoResult<Option<TreeEntry>> {
        let mut parts = path.split('/').filter(|p| !p.is_empty()).peekable();
        if parts.peek().is_none() {
            return Ok(None);
        }

        let mut tree = self.read_tree(tree_id)?;
        while let Some(part) = parts.next() {
            let Some(entry) = tree.get(part) else {
                return Ok(None);
            };
            if parts.peek().is_none() {
                return Ok(Some(entry.clone()));
            }
            if !entry.is_directory() {
                return Ok(None);
            }
            tree = self.read_tree(&entry.object_id)?;
        }
        Ok(None)
    }

    // ---- Pending objects and packs ----

    /// Attach a fresh in-memory buffer that receives every object written
    /// through this repository from now on.
    pub fn attach_mempack(&self, priority: i32) -> Arc<InMemoryObjectStore> {
        let mempack = Arc::new(InMemoryObjectStore::new());
        self.odb.add_backend(mempack.clone(), priority);
        debug!(priority, "mempack attached");
        mempack
    }

    /// Serialize the buffered objects as a pack stream.
    pub fn dump_pending_objects(&self, mempack: &InMemoryObjectStore) -> RepoResult<Vec<u8>> {
        Ok(dump_mempack(mempack, self.config.pack.compression_level)?)
    }

    /// Start ingesting a pack into `objects/pack`.
    pub fn indexer(&self) -> PackIndexer {
        self.packs.indexer()
    }

    /// Pick up packs written since the repository was opened.
    pub fn refresh_packs(&self) -> RepoResult<usize> {
        Ok(self.packs.refresh()?)
    }

    pub fn pack_count(&self) -> usize {
        self.packs.pack_count()
    }

    /// Convenience for callers that hold raw bytes: write a blob through the
    /// object database.
    pub fn write_blob(&self, data: &[u8]) -> RepoResult<ObjectId> {
        Ok(self.odb.write(&Blob::new(data.to_vec()).to_stored_object())?)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .field("packs", &self.packs.pack_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_pack::IndexerProgress;
    use quay_store::{EntryMode, StoreError};

    fn persist(repo: &Repository, mempack: &InMemoryObjectStore) {
        let bytes = repo.dump_pending_objects(mempack).unwrap();
        let mut indexer = repo.indexer();
        let mut progress = IndexerProgress::default();
        indexer.append(&bytes, &mut progress).unwrap();
        indexer.commit(&mut progress).unwrap();
        repo.refresh_packs().unwrap();
        mempack.clear();
    }

    #[test]
    fn init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let repo = Repository::init(&root).unwrap();

        assert!(root.join("config").is_file());
        assert!(root.join("refs/heads").is_dir());
        assert!(root.join("objects/pack").is_dir());
        assert_eq!(
            std::fs::read_to_string(root.join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
        assert_eq!(repo.pack_count(), 0);
        assert_eq!(repo.config(), &RepositoryConfig::default());
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(matches!(
            Repository::init(dir.path()),
            Err(RepoError::AlreadyExists(_))
        ));
    }

    #[test]
    fn open_requires_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(RepoError::NotARepository(_))
        ));
        Repository::open_or_init(dir.path()).unwrap();
        Repository::open_or_init(dir.path()).unwrap();
    }

    #[test]
    fn writes_need_a_mempack() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(matches!(
            repo.write_blob(b"data"),
            Err(RepoError::Store(StoreError::ReadOnly))
        ));

        let mempack = repo.attach_mempack(repo.config().pack.mempack_priority);
        let id = repo.write_blob(b"data").unwrap();
        assert_eq!(mempack.len(), 1);
        assert_eq!(repo.read_blob(&id).unwrap(), b"data");
    }

    #[test]
    fn commit_survives_reopen_after_pack() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mempack = repo.attach_mempack(1000);

        let initial = repo.create_initial_commit(None).unwrap();
        let blob = repo.write_blob(b"hello").unwrap();
        let tree = repo
            .odb()
            .write(
                &Tree::new(vec![TreeEntry::new(EntryMode::Regular, "greeting", blob)])
                    .to_stored_object()
                    .unwrap(),
            )
            .unwrap();
        let sig = repo.default_signature();
        let head = repo
            .create_commit("second", &sig, &[initial], tree, None)
            .unwrap();
        assert_eq!(repo.lookup_branch("main").unwrap(), None);

        persist(&repo, &mempack);
        repo.set_branch("main", head).unwrap();

        let reopened = Repository::open(dir.path()).unwrap();
        assert_eq!(reopened.pack_count(), 1);
        assert_eq!(reopened.lookup_branch("main").unwrap(), Some(head));
        let commit = reopened.lookup_commit(&head).unwrap().unwrap();
        assert_eq!(commit.parents, vec![initial]);
        assert_eq!(commit.author.name, "quay");

        let log = reopened.first_parent_log(head, 10).unwrap();
        let ids: Vec<ObjectId> = log.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![head, initial]);
        assert_eq!(reopened.first_parent_log(head, 1).unwrap().len(), 1);
    }

    #[test]
    fn create_commit_can_update_ref() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let _mempack = repo.attach_mempack(1000);
        let id = repo.create_initial_commit(Some("feature/x")).unwrap();
        assert_eq!(repo.lookup_branch("feature/x").unwrap(), Some(id));
    }

    #[test]
    fn lookup_commit_missing_and_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let _mempack = repo.attach_mempack(1000);

        assert!(repo.lookup_commit(&ObjectId::digest(b"nope")).unwrap().is_none());
        let blob = repo.write_blob(b"not a commit").unwrap();
        assert!(repo.lookup_commit(&blob).is_err());
    }

    #[test]
    fn tree_entry_by_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let _mempack = repo.attach_mempack(1000);

        let blob = repo.write_blob(b"b").unwrap();
        let write = |tree: Tree| repo.odb().write(&tree.to_stored_object().unwrap()).unwrap();
        let sub = write(Tree::new(vec![TreeEntry::new(EntryMode::Regular, "b", blob)]));
        let docs = write(Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "a", blob),
            TreeEntry::new(EntryMode::Directory, "sub", sub),
        ]));
        let root = write(Tree::new(vec![TreeEntry::new(EntryMode::Directory, "docs", docs)]));

        let leaf = repo.tree_entry_by_path(&root, "docs/sub/b").unwrap().unwrap();
        assert_eq!(leaf.object_id, blob);
        assert!(repo.tree_entry_by_path(&root, "docs/sub").unwrap().unwrap().is_directory());
        assert!(repo.tree_entry_by_path(&root, "docs/a/b").unwrap().is_none());
        assert!(repo.tree_entry_by_path(&root, "docs/missing").unwrap().is_none());
        assert!(repo.tree_entry_by_path(&root, "").unwrap().is_none());
    }
}
