use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use quay_store::StoredObject;
use quay_types::ObjectId;
use tracing::debug;

use crate::entry::{encode_varint, type_byte};
use crate::error::{PackError, PackResult};
use crate::index::PackIndex;

pub(crate) const PACK_MAGIC: &[u8; 4] = b"QPAK";
pub(crate) const PACK_VERSION: u32 = 1;
/// Magic, version, and object count.
pub(crate) const PACK_HEADER_LEN: usize = 12;
/// BLAKE3 checksum over everything before it.
pub(crate) const PACK_TRAILER_LEN: usize = 32;

pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Result of writing a pack file.
#[derive(Clone, Debug)]
pub struct PackFile {
    pub pack_path: PathBuf,
    pub index_path: PathBuf,
    pub object_count: usize,
    pub checksum: [u8; 32],
}

impl PackFile {
    /// `pack-<checksum hex>`, shared by the pack and its index.
    pub fn name(&self) -> String {
        pack_name(&self.checksum)
    }
}

fn pack_name(checksum: &[u8; 32]) -> String {
    format!("pack-{}", hex::encode(checksum))
}

/// Builds a pack from a collection of objects.
///
/// Objects are written in insertion order; adding the same object twice
/// stores it once.
pub struct PackWriter {
    level: i32,
    entries: Vec<(ObjectId, StoredObject)>,
    seen: HashSet<ObjectId>,
}

impl PackWriter {
    pub fn new() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Set the zstd level used for every entry.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Queue an object and return its id.
    pub fn add_object(&mut self, obj: &StoredObject) -> ObjectId {
        let id = obj.compute_id();
        if self.seen.insert(id) {
            self.entries.push((id, obj.clone()));
        }
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the pack and index into `pack_dir`.
    pub fn finish(self, pack_dir: &Path) -> PackResult<PackFile> {
        let (pack_data, index) = self.finish_to_bytes()?;
        persist_pack(pack_dir, &pack_data, &index)
    }

    /// Build pack bytes and index in memory (no disk I/O).
    pub fn finish_to_bytes(self) -> PackResult<(Vec<u8>, PackIndex)> {
        let mut pack_data = Vec::new();
        let mut index_entries = Vec::with_capacity(self.entries.len());

        pack_data.extend_from_slice(PACK_MAGIC);
        pack_data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        pack_data.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        for (id, obj) in &self.entries {
            let offset = pack_data.len() as u64;
            pack_data.push(type_byte(obj.kind));

            let compressed = zstd::encode_all(obj.data.as_slice(), self.level)
                .map_err(|e| PackError::CompressionFailed(e.to_string()))?;
            encode_varint(&mut pack_data, obj.data.len() as u64);
            encode_varint(&mut pack_data, compressed.len() as u64);

            let crc = crc32fast::hash(&compressed);
            pack_data.extend_from_slice(&compressed);
            index_entries.push((*id, crc, offset));
        }

        let checksum = *blake3::hash(&pack_data).as_bytes();
        pack_data.extend_from_slice(&checksum);

        Ok((pack_data, PackIndex::build(index_entries, checksum)))
    }
}

impl Default for PackWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Durably place a pack and its index in `pack_dir`.
///
/// Both files go through a temporary file and a rename. The index is renamed
/// last: a pack without an index is ignored by readers.
pub(crate) fn persist_pack(
    pack_dir: &Path,
    pack_data: &[u8],
    index: &PackIndex,
) -> PackResult<PackFile> {
    std::fs::create_dir_all(pack_dir)?;
    let base = pack_dir.join(pack_name(&index.pack_checksum));
    let pack_path = base.with_extension("pack");
    let index_path = base.with_extension("idx");

    write_atomic(pack_dir, &pack_path, pack_data)?;
    write_atomic(pack_dir, &index_path, &index.to_bytes())?;

    debug!(
        pack = %pack_path.display(),
        objects = index.object_count(),
        bytes = pack_data.len(),
        "pack written"
    );
    Ok(PackFile {
        pack_path,
        index_path,
        object_count: index.object_count(),
        checksum: index.pack_checksum,
    })
}

fn write_atomic(dir: &Path, target: &Path, data: &[u8]) -> PackResult<()> {
    let mut tmp = tempfile::Builder::new().prefix(".tmp-pack-").tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| PackError::Io(e.error))?;
    Ok(())
}
