//! Reference management for Quay.
//!
//! Branches are named, mutable pointers to commit ids, stored under the
//! canonical namespace `refs/heads/<name>`. A branch is the only mutable
//! state in a repository; everything it points at is immutable.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- The [`Ref`] type and namespace helpers
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- Branch name validation
//! - [`memory`] -- In-memory [`InMemoryRefStore`] for tests
//! - [`file`] -- [`FileRefStore`], one file per ref under a repository root

pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use file::FileRefStore;
pub use memory::InMemoryRefStore;
pub use names::validate_branch_name;
pub use traits::RefStore;
pub use types::{Ref, BRANCH_PREFIX};
