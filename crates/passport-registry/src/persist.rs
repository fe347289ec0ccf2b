//! Durable snapshot storage for the registry.
//!
//! The whole registry (entry table, indices, issuer set, allocator) is one
//! JSON document written atomically, so a snapshot is a single durable
//! unit: either a mutation is fully on disk or not at all. A SHA-256
//! checksum line over the payload makes offline tampering detectable, and
//! loads additionally replay the structural invariants before a snapshot
//! is accepted.

use crate::digest::digest_bytes;
use crate::error::RegistryError;
use crate::registry::Registry;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Checksum line length: 64 hex chars plus the newline.
const CHECKSUM_LINE: usize = 65;

/// File-backed snapshot store.
///
/// File format: `[64 hex chars of SHA-256(payload)]\n[JSON payload]`
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a file store writing to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Save a registry snapshot, atomically via temp file + rename.
    pub async fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        let payload = serde_json::to_vec(registry)?;
        let mut data = digest_bytes(&payload).into_bytes();
        data.push(b'\n');
        data.extend_from_slice(&payload);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(
            "Saved registry snapshot ({} bytes) to {:?}",
            data.len(),
            self.path
        );
        Ok(())
    }

    /// Load the registry snapshot, verifying the checksum and the
    /// structural invariants. Returns `None` if no snapshot exists yet;
    /// a snapshot that fails verification is an error, never a silent
    /// fresh start.
    pub async fn load(&self) -> Result<Option<Registry>, RegistryError> {
        if !self.path.exists() {
            info!("No registry snapshot at {:?}", self.path);
            return Ok(None);
        }

        let data = fs::read(&self.path).await?;
        if data.len() < CHECKSUM_LINE || data[CHECKSUM_LINE - 1] != b'\n' {
            return Err(RegistryError::Corrupt(
                "snapshot missing checksum header".into(),
            ));
        }

        let stored = std::str::from_utf8(&data[..CHECKSUM_LINE - 1])
            .map_err(|_| RegistryError::Corrupt("checksum header is not hex".into()))?;
        let payload = &data[CHECKSUM_LINE..];

        if digest_bytes(payload) != stored {
            return Err(RegistryError::Corrupt("checksum mismatch".into()));
        }

        let registry: Registry = serde_json::from_slice(payload)?;
        registry.check_consistency()?;

        info!(
            "Loaded registry snapshot with {} records from {:?}",
            registry.count(),
            self.path
        );
        Ok(Some(registry))
    }

    /// Check if a snapshot file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// In-memory store for tests or deliberately ephemeral deployments.
pub struct MemoryStore;

impl MemoryStore {
    /// "Save" does nothing for the memory store.
    pub async fn save(&self, _registry: &Registry) -> Result<(), RegistryError> {
        debug!("Memory store: save is a no-op");
        Ok(())
    }

    /// "Load" finds nothing for the memory store.
    pub async fn load(&self) -> Result<Option<Registry>, RegistryError> {
        debug!("Memory store: no snapshot");
        Ok(None)
    }
}

/// Snapshot storage backend.
pub enum SnapshotStore {
    /// Checksummed file snapshots
    File(FileStore),
    /// No persistence
    Memory(MemoryStore),
}

impl SnapshotStore {
    /// File-backed store at `path`.
    pub fn file(path: PathBuf) -> Self {
        SnapshotStore::File(FileStore::new(path))
    }

    /// In-memory store.
    pub fn memory() -> Self {
        SnapshotStore::Memory(MemoryStore)
    }

    /// Save a snapshot.
    pub async fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        match self {
            SnapshotStore::File(s) => s.save(registry).await,
            SnapshotStore::Memory(s) => s.save(registry).await,
        }
    }

    /// Load the latest snapshot, if any.
    pub async fn load(&self) -> Result<Option<Registry>, RegistryError> {
        match self {
            SnapshotStore::File(s) => s.load().await,
            SnapshotStore::Memory(s) => s.load().await,
        }
    }
}
