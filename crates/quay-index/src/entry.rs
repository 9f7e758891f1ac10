//! Index entry type.

use quay_store::{EntryMode, TreeEntry};
use quay_types::ObjectId;
use serde::{Deserialize, Serialize};

/// A staged file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Full slash-separated path from the snapshot root.
    pub path: String,
    /// Content-addressed ID of the file's blob.
    pub object_id: ObjectId,
    pub mode: EntryMode,
}

impl IndexEntry {
    pub fn new(path: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            path: path.into(),
            object_id,
            mode: EntryMode::Regular,
        }
    }

    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The tree entry this file becomes inside its parent directory.
    pub fn to_tree_entry(&self) -> TreeEntry {
        TreeEntry::new(self.mode, self.name(), self.object_id)
    }
}
