//! Staging index for Quay.
//!
//! The index is the mutable working set of a writer: an ordered mapping from
//! slash-separated path to blob id. It is seeded from a snapshot's root tree,
//! mutated by writes and removals, and turned back into a nested tree when
//! the writer commits.
//!
//! # Key Types
//!
//! - [`Index`] -- The in-memory staging area (BTreeMap-backed)
//! - [`IndexEntry`] -- A staged file: path, blob id, mode
//! - [`path`] -- Path validation shared by the index and its callers

pub mod entry;
pub mod error;
pub mod index;
pub mod path;

pub use entry::IndexEntry;
pub use error::{IndexError, IndexResult};
pub use index::Index;
pub use path::validate_path;
