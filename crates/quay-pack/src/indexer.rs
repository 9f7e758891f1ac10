//! Streaming pack ingestion.
//!
//! A [`PackIndexer`] receives a pack as a sequence of byte chunks, then on
//! [`PackIndexer::commit`] verifies it end to end, derives every object id,
//! and writes the pack and a freshly built index into the pack directory.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::entry::{entry_payload, inflate};
use crate::error::{PackError, PackResult};
use crate::index::{read_u32, PackIndex};
use crate::reader::validate_header;
use crate::writer::{persist_pack, PackFile, PACK_HEADER_LEN, PACK_TRAILER_LEN};

/// Progress counters updated by [`PackIndexer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexerProgress {
    pub received_bytes: u64,
    /// Object count from the pack header, once the header has arrived.
    pub total_objects: u32,
    pub indexed_objects: u32,
}

/// Accepts a pack byte stream and materializes it as a pack plus index.
#[derive(Debug)]
pub struct PackIndexer {
    pack_dir: PathBuf,
    buffer: Vec<u8>,
}

impl PackIndexer {
    pub fn new(pack_dir: impl Into<PathBuf>) -> Self {
        Self {
            pack_dir: pack_dir.into(),
            buffer: Vec::new(),
        }
    }

    /// Feed the next chunk of pack bytes.
    pub fn append(&mut self, chunk: &[u8], progress: &mut IndexerProgress) -> PackResult<()> {
        self.buffer.extend_from_slice(chunk);
        progress.received_bytes += chunk.len() as u64;
        if progress.total_objects == 0 && self.buffer.len() >= PACK_HEADER_LEN {
            progress.total_objects = read_u32(&self.buffer, 8);
        }
        Ok(())
    }

    /// Verify the received pack and write it with its index.
    ///
    /// Fails without touching the pack directory if the stream is truncated,
    /// its trailer checksum does not match, or any entry is malformed.
    pub fn commit(self, progress: &mut IndexerProgress) -> PackResult<PackFile> {
        let data = self.buffer;
        if data.len() < PACK_HEADER_LEN + PACK_TRAILER_LEN {
            return Err(PackError::Incomplete(format!(
                "received {} bytes, need at least {}",
                data.len(),
                PACK_HEADER_LEN + PACK_TRAILER_LEN
            )));
        }
        validate_header(&data)?;

        let body_len = data.len() - PACK_TRAILER_LEN;
        let checksum = *blake3::hash(&data[..body_len]).as_bytes();
        if data[body_len..] != checksum {
            return Err(PackError::ChecksumMismatch);
        }

        let count = read_u32(&data, 8);
        progress.total_objects = count;

        let mut entries = Vec::with_capacity(count as usize);
        let mut seen = HashSet::with_capacity(count as usize);
        let mut offset = PACK_HEADER_LEN as u64;
        for _ in 0..count {
            let (header, payload) = entry_payload(&data[..body_len], offset)?;
            let crc = crc32fast::hash(payload);
            let id = inflate(&header, payload, offset)?.compute_id();
            if !seen.insert(id) {
                return Err(PackError::DuplicateObject { id, offset });
            }

            entries.push((id, crc, offset));
            progress.indexed_objects += 1;
            offset += header.entry_len() as u64;
        }
        if offset != body_len as u64 {
            return Err(PackError::CorruptEntry {
                offset,
                reason: format!("{} unexpected bytes after last entry", body_len as u64 - offset),
            });
        }

        let index = PackIndex::build(entries, checksum);
        let pack = persist_pack(&self.pack_dir, &data, &index)?;
        debug!(pack = %pack.name(), objects = count, "pack indexed");
        Ok(pack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::PackReader;
    use crate::writer::PackWriter;
    use quay_store::{Blob, ObjectKind, StoredObject};

    fn sample_pack() -> (Vec<u8>, Vec<StoredObject>) {
        let objects = vec![
            Blob::new(b"first".to_vec()).to_stored_object(),
            Blob::new(b"second".to_vec()).to_stored_object(),
            StoredObject::new(ObjectKind::Tree, b"{\"entries\":[]}".to_vec()),
        ];
        let mut writer = PackWriter::new();
        for obj in &objects {
            writer.add_object(obj);
        }
        (writer.finish_to_bytes().unwrap().0, objects)
    }

    #[test]
    fn chunked_stream_is_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let (bytes, objects) = sample_pack();

        let mut indexer = PackIndexer::new(dir.path());
        let mut progress = IndexerProgress::default();
        for chunk in bytes.chunks(7) {
            indexer.append(chunk, &mut progress).unwrap();
        }
        assert_eq!(progress.received_bytes, bytes.len() as u64);
        assert_eq!(progress.total_objects, 3);
        assert_eq!(progress.indexed_objects, 0);

        let pack = indexer.commit(&mut progress).unwrap();
        assert_eq!(progress.indexed_objects, 3);
        assert_eq!(pack.object_count, 3);

        let reader = PackReader::open(&pack.pack_path).unwrap();
        for obj in objects {
            assert_eq!(reader.read_object(&obj.compute_id()).unwrap(), Some(obj));
        }
    }

    #[test]
    fn truncated_stream_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (bytes, _) = sample_pack();

        let mut indexer = PackIndexer::new(dir.path().join("pack"));
        let mut progress = IndexerProgress::default();
        indexer.append(&bytes[..bytes.len() - 10], &mut progress).unwrap();
        assert!(indexer.commit(&mut progress).is_err());
        assert!(!dir.path().join("pack").exists());
    }

    #[test]
    fn too_short_stream_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let mut indexer = PackIndexer::new(dir.path());
        let mut progress = IndexerProgress::default();
        indexer.append(b"QPAK", &mut progress).unwrap();
        assert!(matches!(
            indexer.commit(&mut progress),
            Err(PackError::Incomplete(_))
        ));
    }

    #[test]
    fn corrupted_byte_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bytes, _) = sample_pack();
        bytes[PACK_HEADER_LEN + 3] ^= 0x01;

        let mut indexer = PackIndexer::new(dir.path());
        let mut progress = IndexerProgress::default();
        indexer.append(&bytes, &mut progress).unwrap();
        assert!(matches!(
            indexer.commit(&mut progress),
            Err(PackError::ChecksumMismatch)
        ));
    }

    #[test]
    fn empty_pack_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let (bytes, _) = PackWriter::new().finish_to_bytes().unwrap();

        let mut indexer = PackIndexer::new(dir.path());
        let mut progress = IndexerProgress::default();
        indexer.append(&bytes, &mut progress).unwrap();
        let pack = indexer.commit(&mut progress).unwrap();
        assert_eq!(pack.object_count, 0);
        assert_eq!(progress, IndexerProgress {
            received_bytes: bytes.len() as u64,
            total_objects: 0,
            indexed_objects: 0,
        });
    }
}
