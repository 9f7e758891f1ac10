//! The core Index structure managing staged entries in memory.
//!
//! The [`Index`] manages a `BTreeMap<String, IndexEntry>` keyed by full path.
//! Blobs are written to the backing store as they are staged; trees are only
//! written when [`Index::write_tree`] folds the flat map back into a nested
//! directory structure.

use std::collections::BTreeMap;
use std::sync::Arc;

use quay_store::{Blob, EntryMode, ObjectStore, Tree, TreeEntry};
use quay_types::ObjectId;
use tracing::debug;

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};
use crate::path::{ancestors, join, validate_path};

/// The staging index: the set of files the next commit will contain.
///
/// A file and a directory can never share a path: staging `a/b` while `a` is
/// a staged file (or the reverse) fails with [`IndexError::PathConflict`].
pub struct Index {
    /// All staged entries, keyed by path.
    entries: BTreeMap<String, IndexEntry>,
    /// Root tree id for the current entries (invalidated on changes).
    tree_cache: Option<ObjectId>,
    /// Where blobs and trees are written.
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .field("tree_cache", &self.tree_cache)
            .finish()
    }
}

/// Directory node used while folding flat paths into nested trees.
enum Node<'a> {
    File(&'a IndexEntry),
    Dir(BTreeMap<&'a str, Node<'a>>),
}

impl Index {
    /// Create a new empty index backed by the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            tree_cache: None,
            store,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a staged file by path.
    pub fn find(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// All staged entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Root tree id of the last `write_tree`/`read_tree`, if nothing changed since.
    pub fn cached_tree(&self) -> Option<ObjectId> {
        self.tree_cache
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Write `data` as a blob and stage it at `path`.
    pub fn add_from_buffer(&mut self, path: &str, data: &[u8]) -> IndexResult<&IndexEntry> {
        validate_path(path)?;
        self.check_conflicts(path)?;

        let object_id = self.store.write(&Blob::new(data.to_vec()).to_stored_object())?;
        self.insert(IndexEntry::new(path, object_id));
        Ok(&self.entries[path])
    }

    /// Stage an entry whose blob is already in the store.
    pub fn add_entry(&mut self, entry: IndexEntry) -> IndexResult<()> {
        validate_path(&entry.path)?;
        self.check_conflicts(&entry.path)?;
        self.insert(entry);
        Ok(())
    }

    /// Unstage a file. Returns the removed entry, if any.
    pub fn remove(&mut self, path: &str) -> Option<IndexEntry> {
        let removed = self.entries.remove(path);
        if removed.is_some() {
            self.tree_cache = None;
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tree_cache = None;
    }

    fn insert(&mut self, entry: IndexEntry) {
        self.entries.insert(entry.path.clone(), entry);
        self.tree_cache = None;
    }

    fn check_conflicts(&self, path: &str) -> IndexResult<()> {
        let conflict = |existing: &str| IndexError::PathConflict {
            path: path.to_string(),
            existing: existing.to_string(),
        };

        if let Some(file) = ancestors(path).find(|a| self.entries.contains_key(*a)) {
            return Err(conflict(file));
        }
        let dir_prefix = format!("{path}/");
        if let Some((nested, _)) = self
            .entries
            .range(dir_prefix.clone()..)
            .next()
            .filter(|(k, _)| k.starts_with(&dir_prefix))
        {
            return Err(conflict(nested));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Tree building
    // ---------------------------------------------------------------

    /// Write the staged entries as nested trees and return the root tree id.
    ///
    /// Identical staged content always yields the identical root id, so the
    /// result can be compared against a parent commit's tree to detect a
    /// no-op commit.
    pub fn write_tree(&mut self) -> IndexResult<ObjectId> {
        if let Some(cached) = self.tree_cache {
            return Ok(cached);
        }

        let mut root: BTreeMap<&str, Node<'_>> = BTreeMap::new();
        for entry in self.entries.values() {
            let mut dir = &mut root;
            let mut parts = entry.path.split('/').peekable();
            while let Some(part) = parts.next() {
                if parts.peek().is_none() {
                    dir.insert(part, Node::File(entry));
                    break;
                }
                let node = dir.entry(part).or_insert_with(|| Node::Dir(BTreeMap::new()));
                dir = match node {
                    Node::Dir(children) => children,
                    Node::File(file) => {
                        return Err(IndexError::PathConflict {
                            path: entry.path.clone(),
                            existing: file.path.clone(),
                        })
                    }
                };
            }
        }

        let tree_id = self.write_dir(&root)?;
        debug!(tree = %tree_id.short_hex(), entries = self.entries.len(), "index written as tree");
        self.tree_cache = Some(tree_id);
        Ok(tree_id)
    }

    fn write_dir(&self, dir: &BTreeMap<&str, Node<'_>>) -> IndexResult<ObjectId> {
        let mut tree_entries = Vec::with_capacity(dir.len());
        for (name, node) in dir {
            let entry = match node {
                Node::File(file) => file.to_tree_entry(),
                Node::Dir(children) => {
                    TreeEntry::new(EntryMode::Directory, *name, self.write_dir(children)?)
                }
            };
            tree_entries.push(entry);
        }
        let stored = Tree::new(tree_entries).to_stored_object()?;
        Ok(self.store.write(&stored)?)
    }

    /// Replace the index contents with every file reachable from `tree_id`.
    pub fn read_tree(&mut self, tree_id: &ObjectId) -> IndexResult<()> {
        let mut entries = BTreeMap::new();
        self.collect_tree(tree_id, "", &mut entries)?;
        self.entries = entries;
        self.tree_cache = Some(*tree_id);
        Ok(())
    }

    fn collect_tree(
        &self,
        tree_id: &ObjectId,
        prefix: &str,
        out: &mut BTreeMap<String, IndexEntry>,
    ) -> IndexResult<()> {
        let stored = self
            .store
            .read(tree_id)?
            .ok_or(IndexError::ObjectNotFound(*tree_id))?;
        let tree = Tree::from_stored_object(&stored)?;

        for te in &tree.entries {
            let path = join(prefix, &te.name);
            if te.is_directory() {
                self.collect_tree(&te.object_id, &path, out)?;
            } else {
                out.insert(
                    path.clone(),
                    IndexEntry {
                        path,
                        object_id: te.object_id,
                        mode: te.mode,
                    },
                );
            }
        }
        Ok(())
    }
}
