//! Content-addressed object storage for Quay.
//!
//! Every piece of data in a Quay repository -- file contents, directory
//! listings, commits -- is stored as an immutable object identified by its
//! BLAKE3 hash (domain-separated by object kind).
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`CommitObject`] -- a snapshot: root tree, parents, signatures, message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store; used as the write
//!   buffer ("mempack") of a writer session and in tests
//! - [`ObjectDatabase`] -- routes reads and writes across prioritised backends
//!
//! Pack-file backends live in `quay-pack`.

pub mod error;
pub mod memory;
pub mod object;
pub mod odb;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, CommitObject, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use odb::ObjectDatabase;
pub use traits::ObjectStore;
