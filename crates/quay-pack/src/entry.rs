//! Per-object entry encoding shared by the writer, reader, and indexer.
//!
//! An entry is a type byte, the uncompressed size and compressed size as
//! LEB128 varints, then the zstd-compressed object data.

use quay_store::{ObjectKind, StoredObject};

use crate::error::{PackError, PackResult};

/// Map an object kind to its pack type byte.
pub fn type_byte(kind: ObjectKind) -> u8 {
    match kind {
        ObjectKind::Blob => 1,
        ObjectKind::Tree => 2,
        ObjectKind::Commit => 3,
    }
}

/// Parse a pack type byte.
pub fn kind_from_type_byte(byte: u8) -> Option<ObjectKind> {
    match byte {
        1 => Some(ObjectKind::Blob),
        2 => Some(ObjectKind::Tree),
        3 => Some(ObjectKind::Commit),
        _ => None,
    }
}

/// Decoded entry header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    pub kind: ObjectKind,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    /// Bytes taken by the type byte and both varints.
    pub header_len: usize,
}

impl EntryHeader {
    /// Parse the header of the entry starting at `offset` in `data`.
    ///
    /// Checks that the compressed payload lies within `data`.
    pub fn parse(data: &[u8], offset: u64) -> PackResult<Self> {
        let corrupt = |reason: String| PackError::CorruptEntry { offset, reason };

        let start = usize::try_from(offset).map_err(|_| corrupt("offset overflow".into()))?;
        let type_byte = *data
            .get(start)
            .ok_or_else(|| corrupt("offset beyond pack data".into()))?;
        let kind = kind_from_type_byte(type_byte)
            .ok_or_else(|| corrupt(format!("unknown type byte: {type_byte}")))?;

        let mut pos = start + 1;
        let mut size = || -> PackResult<u64> {
            let (value, used) =
                decode_varint(&data[pos..]).map_err(|_| corrupt("bad size varint".into()))?;
            pos += used;
            Ok(value)
        };
        let uncompressed_size = size()?;
        let compressed_size = size()?;

        let header_len = pos - start;
        let end = (pos as u64).checked_add(compressed_size);
        if end.map_or(true, |end| end > data.len() as u64) {
            return Err(corrupt("compressed data extends beyond pack".into()));
        }

        Ok(Self {
            kind,
            uncompressed_size,
            compressed_size,
            header_len,
        })
    }

    /// Total encoded length of the entry, payload included.
    pub fn entry_len(&self) -> usize {
        self.header_len + self.compressed_size as usize
    }
}

/// Header and compressed payload of the entry at `offset`.
pub(crate) fn entry_payload(data: &[u8], offset: u64) -> PackResult<(EntryHeader, &[u8])> {
    let header = EntryHeader::parse(data, offset)?;
    let start = offset as usize + header.header_len;
    Ok((header, &data[start..start + header.compressed_size as usize]))
}

/// Decompress an entry payload into the object it encodes.
pub(crate) fn inflate(header: &EntryHeader, payload: &[u8], offset: u64) -> PackResult<StoredObject> {
    let data =
        zstd::decode_all(payload).map_err(|e| PackError::DecompressionFailed(e.to_string()))?;
    if data.len() as u64 != header.uncompressed_size {
        return Err(PackError::CorruptEntry {
            offset,
            reason: format!(
                "size mismatch: expected {}, got {}",
                header.uncompressed_size,
                data.len()
            ),
        });
    }
    Ok(StoredObject::new(header.kind, data))
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> PackResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(PackError::CorruptEntry {
                offset: 0,
                reason: "varint overflow".into(),
            });
        }
    }
    Err(PackError::CorruptEntry {
        offset: 0,
        reason: "truncated varint".into(),
    })
}
