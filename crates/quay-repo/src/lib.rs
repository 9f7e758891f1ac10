//! The Quay repository: a bare directory holding refs, configuration and
//! packs, fronted by an [`ObjectDatabase`](quay_store::ObjectDatabase).
//!
//! [`Repository`] is the storage-engine surface the session layer builds on.
//! It never writes loose objects: new objects go to an in-memory buffer
//! attached with [`Repository::attach_mempack`] and reach disk only when the
//! caller dumps that buffer and feeds it to a [`PackIndexer`](quay_pack::PackIndexer).

pub mod config;
pub mod error;
pub mod repository;

pub use config::{CoreConfig, PackConfig, RepositoryConfig, UserConfig};
pub use error::{RepoError, RepoResult};
pub use repository::{Repository, PACK_PRIORITY};
