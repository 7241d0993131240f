//! Ordered indices: a generic persistable multiway B-tree and the binary
//! codec its key/value types implement.

pub mod btree;

pub use btree::BTree;

use crate::error::{Result, StoreError};
use crate::storage::segment::Location;

/// Fixed little-endian binary codec for index keys and values.
///
/// Every persisted index entry is encoded field-wise with this trait;
/// decoding advances `cursor` and fails with `CorruptRecord` on
/// truncation rather than panicking.
pub trait Codec: Sized {
    fn encode(&self, buf: &mut Vec<u8>);
    fn decode(buf: &[u8], cursor: &mut usize) -> Result<Self>;
}

pub(crate) fn take<'a>(buf: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = cursor
        .checked_add(len)
        .ok_or_else(|| StoreError::CorruptRecord("codec offset overflow".into()))?;
    let slice = buf.get(*cursor..end).ok_or_else(|| {
        StoreError::CorruptRecord(format!("truncated at offset {cursor}, need {len} bytes"))
    })?;
    *cursor = end;
    Ok(slice)
}

pub(crate) fn read_u32(buf: &[u8], cursor: &mut usize) -> Result<u32> {
    let slice = take(buf, cursor, 4)?;
    let bytes: [u8; 4] = slice
        .try_into()
        .map_err(|_| StoreError::CorruptRecord("invalid u32 slice".into()))?;
    Ok(u32::from_le_bytes(bytes))
}

pub(crate) fn read_u64(buf: &[u8], cursor: &mut usize) -> Result<u64> {
    let slice = take(buf, cursor, 8)?;
    let bytes: [u8; 8] = slice
        .try_into()
        .map_err(|_| StoreError::CorruptRecord("invalid u64 slice".into()))?;
    Ok(u64::from_le_bytes(bytes))
}

impl Codec for u64 {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }

    fn decode(buf: &[u8], cursor: &mut usize) -> Result<Self> {
        read_u64(buf, cursor)
    }
}

impl Codec for String {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.as_bytes());
    }

    fn decode(buf: &[u8], cursor: &mut usize) -> Result<Self> {
        let len = read_u32(buf, cursor)? as usize;
        let bytes = take(buf, cursor, len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| StoreError::CorruptRecord("index string is not valid UTF-8".into()))
    }
}

impl Codec for Vec<u64> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());
        for id in self {
            buf.extend_from_slice(&id.to_le_bytes());
        }
    }

    fn decode(buf: &[u8], cursor: &mut usize) -> Result<Self> {
        let count = read_u32(buf, cursor)? as usize;
        let mut ids = Vec::with_capacity(count.min(buf.len() / 8 + 1));
        for _ in 0..count {
            ids.push(read_u64(buf, cursor)?);
        }
        Ok(ids)
    }
}

impl Codec for Location {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.segment_id.to_le_bytes());
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf.extend_from_slice(&self.length.to_le_bytes());
    }

    fn decode(buf: &[u8], cursor: &mut usize) -> Result<Self> {
        let segment_id = read_u64(buf, cursor)?;
        let offset = read_u64(buf, cursor)?;
        let length = read_u32(buf, cursor)?;
        Ok(Location {
            segment_id,
            offset,
            length,
        })
    }
}
