//! Fixed binary representation of a [`Record`].
//!
//! Frame layout, little-endian:
//!
//! ```text
//! magic (4) | version (2) | reserved (2) | payload_len (4) | crc32 (4) | payload
//! ```
//!
//! The payload is field-wise: id, title, authors, year, keywords, then
//! the opaque `extra` map as a JSON object. The crc32 covers the payload
//! only; any mismatch or truncation decodes to `CorruptRecord`, which
//! read paths treat as "record unavailable" rather than a fault.

use crate::error::{Result, StoreError};
use crate::index::{read_u32, read_u64, take, Codec};
use crate::model::Record;

pub const RECORD_MAGIC: &[u8; 4] = b"BREC";
pub const RECORD_VERSION: u16 = 1;
pub const FRAME_HEADER_SIZE: usize = 16;

/// Upper bound on one encoded record; anything larger is rejected before
/// it reaches the log.
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

pub fn encode_record(record: &Record) -> Result<Vec<u8>> {
    let id = record.id.ok_or_else(|| {
        StoreError::InvalidArgument("record must have an assigned id before encoding".into())
    })?;

    let mut payload = Vec::with_capacity(256);
    id.encode(&mut payload);
    record.title.encode(&mut payload);
    encode_str_list(&record.authors, &mut payload);
    record.year.encode(&mut payload);
    encode_str_list(&record.keywords, &mut payload);
    let extra = serde_json::to_vec(&record.extra)
        .map_err(|e| StoreError::Serialization(format!("extra fields: {e}")))?;
    payload.extend_from_slice(&(extra.len() as u32).to_le_bytes());
    payload.extend_from_slice(&extra);

    if payload.len() > MAX_RECORD_SIZE {
        return Err(StoreError::InvalidArgument(format!(
            "record payload exceeds maximum size of {MAX_RECORD_SIZE} bytes"
        )));
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.extend_from_slice(RECORD_MAGIC);
    frame.extend_from_slice(&RECORD_VERSION.to_le_bytes());
    frame.extend_from_slice(&0u16.to_le_bytes()); // reserved
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub fn decode_record(bytes: &[u8]) -> Result<Record> {
    if bytes.len() < FRAME_HEADER_SIZE || &bytes[..RECORD_MAGIC.len()] != RECORD_MAGIC {
        return Err(StoreError::CorruptRecord(
            "record frame missing magic header".into(),
        ));
    }
    let mut cursor = RECORD_MAGIC.len();
    let version = u16::from_le_bytes(
        take(bytes, &mut cursor, 2)?
            .try_into()
            .map_err(|_| StoreError::CorruptRecord("invalid record version".into()))?,
    );
    if version != RECORD_VERSION {
        return Err(StoreError::CorruptRecord(format!(
            "unsupported record format version {version}"
        )));
    }
    cursor += 2; // reserved
    let payload_len = read_u32(bytes, &mut cursor)? as usize;
    if payload_len > MAX_RECORD_SIZE {
        return Err(StoreError::CorruptRecord(format!(
            "record payload length {payload_len} exceeds maximum {MAX_RECORD_SIZE}"
        )));
    }
    let expected_crc = read_u32(bytes, &mut cursor)?;
    let payload = take(bytes, &mut cursor, payload_len)?;
    if crc32fast::hash(payload) != expected_crc {
        return Err(StoreError::CorruptRecord("record checksum mismatch".into()));
    }

    let mut cursor = 0;
    let id = read_u64(payload, &mut cursor)?;
    let title = String::decode(payload, &mut cursor)?;
    let authors = decode_str_list(payload, &mut cursor)?;
    let year = read_u64(payload, &mut cursor)?;
    let keywords = decode_str_list(payload, &mut cursor)?;
    let extra_len = read_u32(payload, &mut cursor)? as usize;
    let extra_bytes = take(payload, &mut cursor, extra_len)?;
    let extra = serde_json::from_slice(extra_bytes)
        .map_err(|e| StoreError::CorruptRecord(format!("extra fields: {e}")))?;

    Ok(Record {
        id: Some(id),
        title,
        authors,
        year,
        keywords,
        extra,
    })
}

fn encode_str_list(items: &[String], buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(items.len() as u32).to_le_bytes());
    for item in items {
        item.encode(buf);
    }
}

fn decode_str_list(buf: &[u8], cursor: &mut usize) -> Result<Vec<String>> {
    let count = read_u32(buf, cursor)? as usize;
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(String::decode(buf, cursor)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let mut record = Record::new(
            "The Power of Pivoting",
            vec!["Shweta Jain".into(), "C. Seshadhri".into()],
            2020,
            vec!["clique".into(), "counting".into()],
        );
        record.id = Some(7);
        record.extra.insert("booktitle".into(), "WSDM".into());
        record.extra.insert("pages".into(), "268-276".into());
        record
    }

    #[test]
    fn roundtrip() {
        let record = sample();
        let bytes = encode_record(&record).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), record);
    }

    #[test]
    fn encode_requires_assigned_id() {
        let mut record = sample();
        record.id = None;
        let err = encode_record(&record).expect_err("unassigned id should error");
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let mut bytes = encode_record(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x40;
        let err = decode_record(&bytes).expect_err("corrupted payload should error");
        match err {
            StoreError::CorruptRecord(message) => {
                assert!(
                    message.contains("checksum"),
                    "unexpected message: {message}"
                );
            }
            other => panic!("expected corrupt record error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_frame_is_corrupt() {
        let bytes = encode_record(&sample()).unwrap();
        let err = decode_record(&bytes[..bytes.len() / 2]).expect_err("truncation should error");
        assert!(matches!(err, StoreError::CorruptRecord(_)));
    }

    #[test]
    fn bad_magic_is_corrupt() {
        let mut bytes = encode_record(&sample()).unwrap();
        bytes[0] = b'X';
        let err = decode_record(&bytes).expect_err("bad magic should error");
        assert!(matches!(err, StoreError::CorruptRecord(_)));
    }
}
