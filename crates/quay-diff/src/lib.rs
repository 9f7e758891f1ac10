//! Diff engine for Quay.
//!
//! Compares two snapshot trees and reports path-level changes. Trees are
//! walked recursively, and subtrees whose ids match are skipped without
//! being read, so the cost is proportional to what changed.
//!
//! # Key Types
//!
//! - [`TreeDiff`] / [`TreeChange`] -- Flat list of changed file paths
//! - [`ChangeStatus`] -- Added, Modified, or Deleted
//! - [`DiffOptions`] -- Knobs for a diff run

pub mod error;
pub mod tree_diff;

pub use error::{DiffError, DiffResult};
pub use tree_diff::{diff_trees, is_binary, ChangeStatus, DiffOptions, TreeChange, TreeDiff};
