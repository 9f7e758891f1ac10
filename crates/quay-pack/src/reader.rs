use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use quay_store::StoredObject;
use quay_types::ObjectId;

use crate::entry::{entry_payload, inflate};
use crate::error::{PackError, PackResult};
use crate::index::{read_u32, PackIndex};
use crate::writer::{PACK_HEADER_LEN, PACK_MAGIC, PACK_TRAILER_LEN, PACK_VERSION};

/// Backing bytes of an open pack.
enum PackData {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for PackData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Mapped(map) => map,
        }
    }
}

/// Reads objects from a pack file using an index for random access.
pub struct PackReader {
    data: PackData,
    index: PackIndex,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for PackReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackReader")
            .field("path", &self.path)
            .field("bytes", &self.data.len())
            .field("objects", &self.index.object_count())
            .finish()
    }
}

impl PackReader {
    /// Open from raw bytes.
    pub fn from_bytes(pack_data: Vec<u8>, index: PackIndex) -> PackResult<Self> {
        Self::new(PackData::Owned(pack_data), index, None)
    }

    /// Open `<name>.pack` and its sibling `<name>.idx`, memory-mapping the pack.
    pub fn open(pack_path: &Path) -> PackResult<Self> {
        let index_data = std::fs::read(pack_path.with_extension("idx"))?;
        let index = PackIndex::from_bytes(&index_data)?;

        let file = File::open(pack_path)?;
        // SAFETY: pack files are written once through a rename and never
        // modified in place afterwards.
        let map = unsafe { Mmap::map(&file)? };
        Self::new(PackData::Mapped(map), index, Some(pack_path.to_path_buf()))
    }

    fn new(data: PackData, index: PackIndex, path: Option<PathBuf>) -> PackResult<Self> {
        validate_header(&data)?;
        let trailer = &data[data.len() - PACK_TRAILER_LEN..];
        if trailer != index.pack_checksum.as_slice() {
            return Err(PackError::ChecksumMismatch);
        }
        let count = read_u32(&data, 8) as usize;
        if count != index.object_count() {
            return Err(PackError::IndexCorrupted(format!(
                "pack holds {count} objects, index lists {}",
                index.object_count()
            )));
        }
        Ok(Self { data, index, path })
    }

    /// Read an object by ID.
    pub fn read_object(&self, id: &ObjectId) -> PackResult<Option<StoredObject>> {
        let Some((offset, expected_crc)) = self.index.lookup(id) else {
            return Ok(None);
        };
        let (header, payload) = entry_payload(&self.data, offset)?;
        if crc32fast::hash(payload) != expected_crc {
            return Err(PackError::CrcMismatch { id: *id });
        }
        Ok(Some(inflate(&header, payload, offset)?))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains(id)
    }

    pub fn object_count(&self) -> usize {
        self.index.object_count()
    }

    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    /// On-disk location, for packs opened from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn object_ids(&self) -> &[ObjectId] {
        &self.index.object_ids
    }
}

/// Check magic, version, and minimum length of a pack.
pub(crate) fn validate_header(data: &[u8]) -> PackResult<()> {
    if data.len() < PACK_HEADER_LEN + PACK_TRAILER_LEN {
        return Err(PackError::CorruptEntry {
            offset: 0,
            reason: "pack data too short".into(),
        });
    }
    if &data[0..4] != PACK_MAGIC {
        return Err(PackError::InvalidMagic {
            expected: String::from_utf8_lossy(PACK_MAGIC).into(),
            actual: String::from_utf8_lossy(&data[0..4]).into(),
        });
    }
    let version = read_u32(data, 4);
    if version != PACK_VERSION {
        return Err(PackError::UnsupportedVersion(version));
    }
    Ok(())
}
