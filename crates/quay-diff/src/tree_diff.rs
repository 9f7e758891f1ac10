//! Tree-level diff: compare two snapshot trees and list changed files.
//!
//! Entries are matched by name at each level. Matching subtrees recurse;
//! identical ids are skipped without reading. When a path switches between
//! file and directory, every file on the old side is reported deleted and
//! every file on the new side added.

use std::cmp::Ordering;

use quay_store::{Blob, ObjectStore, Tree, TreeEntry};
use quay_types::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiffError, DiffResult};

/// Bytes inspected when sniffing blob content for binary data.
const BINARY_SNIFF_LEN: usize = 8000;

/// Kind of change at a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
}

/// A single changed file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeChange {
    /// Full slash-separated path.
    pub path: String,
    pub status: ChangeStatus,
    /// Blob id on the old side (`None` for additions).
    pub old_id: Option<ObjectId>,
    /// Blob id on the new side (`None` for deletions).
    pub new_id: Option<ObjectId>,
    /// Whether the content looks binary; `None` when the check was skipped.
    pub binary: Option<bool>,
}

/// The result of comparing two trees, in path order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeDiff {
    pub changes: Vec<TreeChange>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Changes with the given status.
    pub fn with_status(&self, status: ChangeStatus) -> impl Iterator<Item = &TreeChange> {
        self.changes.iter().filter(move |c| c.status == status)
    }
}

/// Options for a diff run.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiffOptions {
    /// Skip reading blobs to classify them as binary. Changes are still found
    /// by id comparison.
    pub skip_binary_check: bool,
}

/// Heuristic binary check: a NUL byte within the first 8000 bytes.
pub fn is_binary(data: &[u8]) -> bool {
    data.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Compare two trees and produce a diff.
///
/// `None` on either side stands for an empty tree. Both trees, and every
/// differing subtree, are read from `store`.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: Option<&ObjectId>,
    options: DiffOptions,
) -> DiffResult<TreeDiff> {
    let mut walker = Walker {
        store,
        options,
        changes: Vec::new(),
    };
    if old_tree != new_tree {
        walker.diff_dirs("", old_tree, new_tree)?;
    }
    debug!(changes = walker.changes.len(), "tree diff computed");
    Ok(TreeDiff {
        changes: walker.changes,
    })
}

struct Walker<'a> {
    store: &'a dyn ObjectStore,
    options: DiffOptions,
    changes: Vec<TreeChange>,
}

impl Walker<'_> {
    fn load(&self, id: Option<&ObjectId>) -> DiffResult<Vec<TreeEntry>> {
        let Some(id) = id else {
            return Ok(Vec::new());
        };
        let stored = self.store.read(id)?.ok_or(DiffError::ObjectNotFound(*id))?;
        Ok(Tree::from_stored_object(&stored)?.entries)
    }

    fn diff_dirs(
        &mut self,
        prefix: &str,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
    ) -> DiffResult<()> {
        let old_entries = self.load(old)?;
        let new_entries = self.load(new)?;

        // Both listings are sorted by name; merge them.
        let (mut i, mut j) = (0, 0);
        while i < old_entries.len() || j < new_entries.len() {
            let order = match (old_entries.get(i), new_entries.get(j)) {
                (Some(o), Some(n)) => o.name.cmp(&n.name),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            match order {
                Ordering::Less => {
                    self.side(prefix, &old_entries[i], ChangeStatus::Deleted)?;
                    i += 1;
                }
                Ordering::Greater => {
                    self.side(prefix, &new_entries[j], ChangeStatus::Added)?;
                    j += 1;
                }
                Ordering::Equal => {
                    self.pair(prefix, &old_entries[i], &new_entries[j])?;
                    i += 1;
                    j += 1;
                }
            }
        }
        Ok(())
    }

    /// An entry present on both sides.
    fn pair(&mut self, prefix: &str, old: &TreeEntry, new: &TreeEntry) -> DiffResult<()> {
        if old.object_id == new.object_id && old.mode == new.mode {
            return Ok(());
        }
        match (old.is_directory(), new.is_directory()) {
            (true, true) => {
                let path = join(prefix, &old.name);
                self.diff_dirs(&path, Some(&old.object_id), Some(&new.object_id))
            }
            (false, false) => {
                let path = join(prefix, &new.name);
                let binary = self.sniff(&new.object_id)?;
                self.changes.push(TreeChange {
                    path,
                    status: ChangeStatus::Modified,
                    old_id: Some(old.object_id),
                    new_id: Some(new.object_id),
                    binary,
                });
                Ok(())
            }
            _ => {
                self.side(prefix, old, ChangeStatus::Deleted)?;
                self.side(prefix, new, ChangeStatus::Added)
            }
        }
    }

    /// An entry present on one side only: report every file beneath it.
    fn side(&mut self, prefix: &str, entry: &TreeEntry, status: ChangeStatus) -> DiffResult<()> {
        let path = join(prefix, &entry.name);
        if entry.is_directory() {
            return match status {
                ChangeStatus::Deleted => self.diff_dirs(&path, Some(&entry.object_id), None),
                _ => self.diff_dirs(&path, None, Some(&entry.object_id)),
            };
        }

        let binary = self.sniff(&entry.object_id)?;
        let (old_id, new_id) = match status {
            ChangeStatus::Deleted => (Some(entry.object_id), None),
            _ => (None, Some(entry.object_id)),
        };
        self.changes.push(TreeChange {
            path,
            status,
            old_id,
            new_id,
            binary,
        });
        Ok(())
    }

    fn sniff(&self, blob_id: &ObjectId) -> DiffResult<Option<bool>> {
        if self.options.skip_binary_check {
            return Ok(None);
        }
        let stored = self
            .store
            .read(blob_id)?
            .ok_or(DiffError::ObjectNotFound(*blob_id))?;
        Ok(Some(is_binary(&Blob::from_stored_object(stored)?.data)))
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
