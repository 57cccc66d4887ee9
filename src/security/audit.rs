//! Append-only JSONL audit writer shared by the security log and the
//! hallucination log, and the monotone `REQ_<timestamp>_<seq>` request-id
//! generator.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{Result, StorageError};

static REQUEST_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Builds the next monotone request id: `REQ_<YYYYMMDDHHMMSS>_<6-digit-seq>`.
#[must_use]
pub fn next_request_id(now_unix_seconds: i64) -> String {
    let seq = REQUEST_SEQUENCE.fetch_add(1, Ordering::SeqCst) % 1_000_000;
    format!(
        "REQ_{}_{seq:06}",
        crate::timestamp::format_compact(now_unix_seconds)
    )
}

/// A single append-only, line-flushed JSONL log file guarded by a
/// process-wide lock, so concurrent writers can't interleave partial
/// lines.
pub struct AuditLog {
    writer: Mutex<File>,
}

impl AuditLog {
    /// Opens (creating if absent) the log file at `path` in append mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::AuditWrite(e.to_string()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StorageError::AuditWrite(e.to_string()))?;
        Ok(Self {
            writer: Mutex::new(file),
        })
    }

    /// Serializes `record` as one JSON line and flushes it immediately.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}").map_err(|e| StorageError::AuditWrite(e.to_string()))?;
        writer.flush().map_err(|e| StorageError::AuditWrite(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct SampleRecord {
        value: u32,
    }

    #[test]
    fn test_request_ids_are_monotone_within_a_process() {
        let a = next_request_id(1_700_000_000);
        let b = next_request_id(1_700_000_000);
        assert_ne!(a, b);
        assert!(a.starts_with("REQ_"));
    }

    #[test]
    fn test_append_writes_one_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();
        log.append(&SampleRecord { value: 1 }).unwrap();
        log.append(&SampleRecord { value: 2 }).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: SampleRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, SampleRecord { value: 1 });
    }
}
