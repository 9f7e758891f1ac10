//! The [`RefStore`] trait defining the reference storage interface.

use quay_types::ObjectId;

use crate::error::Result;
use crate::types::{Ref, BRANCH_PREFIX};

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`) and make each single
/// ref update atomic: a concurrent reader sees either the old or the new
/// target, never a torn value. Multi-ref transactions are not offered.
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/main").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// Create or move a ref.
    fn write_ref(&self, reference: &Ref) -> Result<()>;

    /// Delete a ref by canonical name. Returns `true` if it existed.
    fn delete_ref(&self, name: &str) -> Result<bool>;

    /// List all refs whose canonical name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>>;

    /// List all branch refs.
    fn branches(&self) -> Result<Vec<Ref>> {
        self.list_refs(BRANCH_PREFIX)
    }

    /// Resolve a short branch name to its head commit.
    fn read_branch(&self, branch: &str) -> Result<Option<ObjectId>> {
        Ok(self
            .read_ref(&format!("{BRANCH_PREFIX}{branch}"))?
            .map(|r| r.target))
    }

    /// Point a short branch name at `target`, creating it if needed.
    fn write_branch(&self, branch: &str, target: ObjectId) -> Result<()> {
        self.write_ref(&Ref::branch(branch, target)?)
    }
}
