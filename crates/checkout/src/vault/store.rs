//! Pluggable key/value backends for the customer vault.
//!
//! A [`VaultStore`] holds one opaque string payload. The vault writes the
//! same payload to two independent stores so that losing either one loses
//! nothing. Expiry is a store concern: a write may carry a time-to-live,
//! and an expired payload reads back as absent.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors a backing store may report.
///
/// The vault swallows these after logging; they exist so store
/// implementations can say *what* went wrong.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The stored payload could not be decoded.
    #[error("store payload is corrupt: {0}")]
    Corrupt(String),
}

/// One slot of opaque string storage with optional expiry.
pub trait VaultStore: Send + Sync {
    /// Read the payload, if present and not expired.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the medium cannot be read or the payload
    /// is corrupt.
    fn read(&self) -> Result<Option<String>, StoreError>;

    /// Write the payload, replacing any previous one. A `ttl` of `None`
    /// means the payload does not expire.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the medium cannot be written.
    fn write(&self, payload: &str, ttl: Option<Duration>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct Slot {
    payload: String,
    expires_at: Option<DateTime<Utc>>,
}

fn expiry_from(ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    ttl.and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| Utc::now() + d)
}

fn is_expired(expires_at: Option<DateTime<Utc>>) -> bool {
    expires_at.is_some_and(|at| at <= Utc::now())
}

/// In-memory store, the process-lifetime primary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Slot>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VaultStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        let guard = self
            .slot
            .lock()
            .map_err(|e| StoreError::Corrupt(format!("poisoned lock: {e}")))?;
        Ok(guard
            .as_ref()
            .filter(|slot| !is_expired(slot.expires_at))
            .map(|slot| slot.payload.clone()))
    }

    fn write(&self, payload: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StoreError::Corrupt(format!("poisoned lock: {e}")))?;
        *guard = Some(Slot {
            payload: payload.to_owned(),
            expires_at: expiry_from(ttl),
        });
        Ok(())
    }
}

/// Envelope persisted by [`JsonFileStore`].
#[derive(Debug, Serialize, Deserialize)]
struct FileEnvelope {
    expires_at: Option<DateTime<Utc>>,
    payload: String,
}

/// File-backed store, the durable fallback.
///
/// The payload is wrapped in a small JSON envelope carrying its expiry so
/// that restarts honor the time-to-live the writer asked for.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store persisting to `path`. The file is created on first
    /// write; a missing file reads as empty.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VaultStore for JsonFileStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope: FileEnvelope =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if is_expired(envelope.expires_at) {
            return Ok(None);
        }

        Ok(Some(envelope.payload))
    }

    fn write(&self, payload: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let envelope = FileEnvelope {
            expires_at: expiry_from(ttl),
            payload: payload.to_owned(),
        };
        let json = serde_json::to_string(&envelope)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.read().unwrap().is_none());

        store.write("hello", None).unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("hello"));

        store.write("replaced", None).unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("replaced"));
    }

    #[test]
    fn test_memory_store_expiry() {
        let store = MemoryStore::new();
        store.write("gone", Some(Duration::ZERO)).unwrap();
        assert!(store.read().unwrap().is_none());

        store.write("kept", Some(Duration::from_secs(3600))).unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("customers.json"));

        assert!(store.read().unwrap().is_none());
        store.write("[1,2,3]", None).unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_file_store_expiry_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.json");

        JsonFileStore::new(&path)
            .write("stale", Some(Duration::ZERO))
            .unwrap();
        // A fresh handle over the same file still sees it as expired.
        assert!(JsonFileStore::new(&path).read().unwrap().is_none());
    }

    #[test]
    fn test_file_store_corrupt_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.json");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(matches!(
            JsonFileStore::new(&path).read(),
            Err(StoreError::Corrupt(_))
        ));
    }
}
