//! Pack file format for Quay.
//!
//! Objects are stored durably only in packs: zstd-compressed, CRC-checked
//! files with a BLAKE3 trailer, each paired with an index for O(log n)
//! lookups. Writers buffer new objects in memory and materialize them as one
//! pack per flush.
//!
//! # Architecture
//!
//! - **Pack file** (`.pack`): header, compressed entries, BLAKE3 checksum
//! - **Pack index** (`.idx`): fan-out table + sorted IDs, CRCs, offsets
//! - [`PackWriter`]: builds packs from objects
//! - [`PackReader`]: random-access reads from a memory-mapped pack
//! - [`PackIndexer`]: verifies a streamed pack and writes it with its index
//! - [`PackManager`] / [`PackedObjectStore`]: every pack of a repository,
//!   exposed as a read-only object store

pub mod entry;
pub mod error;
pub mod index;
pub mod indexer;
pub mod manager;
pub mod reader;
pub mod store;
pub mod writer;

pub use error::{PackError, PackResult};
pub use index::PackIndex;
pub use indexer::{IndexerProgress, PackIndexer};
pub use manager::PackManager;
pub use reader::PackReader;
pub use store::{dump_mempack, PackedObjectStore};
pub use writer::{PackFile, PackWriter, DEFAULT_COMPRESSION_LEVEL};
