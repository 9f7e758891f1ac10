//! Core reference type.

use quay_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;

/// Canonical prefix for branch refs.
pub const BRANCH_PREFIX: &str = "refs/heads/";

/// A named pointer to a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ref {
    /// Canonical name, e.g. `refs/heads/main`.
    pub name: String,
    /// Commit the ref points at.
    pub target: ObjectId,
}

impl Ref {
    /// Build a branch ref from a short branch name, validating it.
    pub fn branch(name: &str, target: ObjectId) -> Result<Self> {
        validate_branch_name(name)?;
        Ok(Self {
            name: format!("{BRANCH_PREFIX}{name}"),
            target,
        })
    }

    /// The name without the `refs/heads/` prefix for branches, or the full
    /// name otherwise.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix(BRANCH_PREFIX).unwrap_or(&self.name)
    }

    pub fn is_branch(&self) -> bool {
        self.name.starts_with(BRANCH_PREFIX)
    }
}

/// Check that `name` is a canonical ref name the stores accept.
pub(crate) fn check_ref_name(name: &str) -> Result<()> {
    match name.strip_prefix(BRANCH_PREFIX) {
        Some(branch) => validate_branch_name(branch),
        None => Err(RefError::InvalidRefName(name.to_string())),
    }
}
