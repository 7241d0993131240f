//! Append-only record log split across size-capped segment files.
//!
//! Segments live in the log directory as `records_<first_id>.bin`, where
//! `<first_id>` is the id of the first record appended to that segment.
//! Appends go to the current segment until writing would exceed the size
//! cap, at which point the segment is sealed and a new one is opened.
//! Sealed segments are never rewritten.

use crate::error::{Result, StoreError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SEGMENT_PREFIX: &str = "records_";
const SEGMENT_SUFFIX: &str = ".bin";

/// Address of one record's bytes: a disjoint byte range inside one
/// segment, owned exclusively by the main index entry for that record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Location {
    /// First record id of the segment holding the bytes.
    pub segment_id: u64,
    pub offset: u64,
    pub length: u32,
}

/// The append-only binary record log.
///
/// `append` is the only mutator and is not safe for concurrent
/// invocation without external serialization; the catalog's single
/// writer provides that.
#[derive(Debug)]
pub struct SegmentLog {
    dir: PathBuf,
    max_segment_bytes: u64,
    /// First record id of the segment currently accepting appends.
    current_id: u64,
    current_len: u64,
}

impl SegmentLog {
    /// Opens the log in `dir`, creating it if needed.
    ///
    /// Scans the directory for existing segments, parses the trailing
    /// numeric id from each filename, and resumes appending to the
    /// highest one. Rotation past a full segment happens lazily on the
    /// next append, which knows the record id to name the new segment by.
    pub fn open(dir: impl Into<PathBuf>, max_segment_bytes: u64) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut current_id = 1;
        let mut current_len = 0;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(id) = parse_segment_id(&name.to_string_lossy()) else {
                continue;
            };
            if id >= current_id {
                current_id = id;
                current_len = entry.metadata()?.len();
            }
        }
        debug!(
            dir = %dir.display(),
            segment = current_id,
            bytes = current_len,
            "opened record log"
        );

        Ok(Self {
            dir,
            max_segment_bytes,
            current_id,
            current_len,
        })
    }

    /// Appends one encoded record, returning its location.
    ///
    /// `record_id` names the new segment if this append rotates.
    pub fn append(&mut self, record_id: u64, bytes: &[u8]) -> Result<Location> {
        if self.current_len > 0 && self.current_len + bytes.len() as u64 > self.max_segment_bytes {
            info!(
                sealed = self.current_id,
                next = record_id,
                "segment reached size cap, rotating"
            );
            self.current_id = record_id;
            self.current_len = 0;
        }

        let path = self.segment_path(self.current_id);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(bytes)?;
        file.sync_data()?;
        self.current_len = offset + bytes.len() as u64;

        Ok(Location {
            segment_id: self.current_id,
            offset,
            length: bytes.len() as u32,
        })
    }

    /// Exact-length positioned read of one record's bytes.
    ///
    /// A missing or truncated segment surfaces as `CorruptRecord`, which
    /// callers treat as "record unavailable", never a process fault.
    pub fn read(&self, location: &Location) -> Result<Vec<u8>> {
        let path = self.segment_path(location.segment_id);
        let mut file = File::open(&path).map_err(|e| {
            warn!(segment = location.segment_id, error = %e, "segment unreadable");
            StoreError::CorruptRecord(format!(
                "segment {} missing or unreadable: {e}",
                location.segment_id
            ))
        })?;
        file.seek(SeekFrom::Start(location.offset))?;
        let mut bytes = vec![0u8; location.length as usize];
        file.read_exact(&mut bytes).map_err(|e| {
            warn!(
                segment = location.segment_id,
                offset = location.offset,
                length = location.length,
                "segment truncated"
            );
            StoreError::CorruptRecord(format!(
                "segment {} truncated at offset {}: {e}",
                location.segment_id, location.offset
            ))
        })?;
        Ok(bytes)
    }

    /// First record id of the segment currently accepting appends.
    pub fn current_segment_id(&self) -> u64 {
        self.current_id
    }

    fn segment_path(&self, segment_id: u64) -> PathBuf {
        self.dir
            .join(format!("{SEGMENT_PREFIX}{segment_id}{SEGMENT_SUFFIX}"))
    }
}

fn parse_segment_id(name: &str) -> Option<u64> {
    name.strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?
        .parse()
        .ok()
}

/// Lists segment files under `dir`, useful for diagnostics.
pub fn segment_ids(dir: &Path) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        if let Some(id) = parse_segment_id(&entry?.file_name().to_string_lossy()) {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SegmentLog::open(dir.path(), 1024).unwrap();

        let a = log.append(1, b"first record").unwrap();
        let b = log.append(2, b"second record").unwrap();

        assert_eq!(log.read(&a).unwrap(), b"first record");
        assert_eq!(log.read(&b).unwrap(), b"second record");
        assert_eq!(a.segment_id, b.segment_id);
        assert_eq!(b.offset, a.length as u64);
    }

    #[test]
    fn rotation_names_segment_by_first_record_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SegmentLog::open(dir.path(), 32).unwrap();

        let a = log.append(1, &[b'a'; 20]).unwrap();
        // 20 + 20 > 32: rotates, new segment named by record 2
        let b = log.append(2, &[b'b'; 20]).unwrap();
        assert_eq!(a.segment_id, 1);
        assert_eq!(b.segment_id, 2);
        assert_eq!(b.offset, 0);

        assert!(dir.path().join("records_1.bin").exists());
        assert!(dir.path().join("records_2.bin").exists());

        // sealed segment stays readable
        assert_eq!(log.read(&a).unwrap(), vec![b'a'; 20]);
        assert_eq!(segment_ids(dir.path()).unwrap(), vec![1, 2]);
    }

    #[test]
    fn reopen_resumes_highest_segment() {
        let dir = tempfile::tempdir().unwrap();
        let first = {
            let mut log = SegmentLog::open(dir.path(), 1024).unwrap();
            log.append(1, b"before restart").unwrap()
        };

        let mut log = SegmentLog::open(dir.path(), 1024).unwrap();
        assert_eq!(log.current_segment_id(), 1);
        let second = log.append(2, b"after restart").unwrap();
        assert_eq!(second.segment_id, 1);
        assert_eq!(second.offset, first.length as u64);
        assert_eq!(log.read(&first).unwrap(), b"before restart");
    }

    #[test]
    fn read_from_missing_segment_is_corrupt_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let log = SegmentLog::open(dir.path(), 1024).unwrap();
        let err = log
            .read(&Location {
                segment_id: 99,
                offset: 0,
                length: 8,
            })
            .expect_err("missing segment should error");
        assert!(matches!(err, StoreError::CorruptRecord(_)));
    }

    #[test]
    fn read_past_end_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SegmentLog::open(dir.path(), 1024).unwrap();
        let loc = log.append(1, b"short").unwrap();
        let err = log
            .read(&Location {
                length: loc.length + 100,
                ..loc
            })
            .expect_err("truncated read should error");
        match err {
            StoreError::CorruptRecord(message) => {
                assert!(
                    message.contains("truncated"),
                    "unexpected message: {message}"
                );
            }
            other => panic!("expected corrupt record error, got {other:?}"),
        }
    }
}
