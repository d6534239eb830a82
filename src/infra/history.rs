//! JSON-file history store.
//!
//! The recent-lookup list is written as one JSON array, most recent first.
//! Saves go through a sibling temp file and a rename, so a reader never sees
//! a partially written list.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::{AppError, ConfigError, HistoryStore, LookupHistoryEntry};

const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, Clone)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/guardia-ip/history.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::data_dir()
            .map(|dir| dir.join("guardia-ip").join(HISTORY_FILE_NAME))
            .ok_or(ConfigError::MissingDefault("history path"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| HISTORY_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn load(&self) -> Result<Vec<LookupHistoryEntry>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(AppError::Storage(e.to_string())),
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Unreadable history is dropped; the next save replaces the file.
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "History file is corrupt, starting from an empty list"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, entries: &[LookupHistoryEntry]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        debug!(path = %self.path.display(), count = entries.len(), "History saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "History cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThreatLevel;

    fn entry(address: &str) -> LookupHistoryEntry {
        LookupHistoryEntry {
            id: format!("id-{}", address),
            address: address.to_string(),
            timestamp_display: "2026-10-15 09:00:00".to_string(),
            location_summary: "Paris, France".to_string(),
            threat_level: ThreatLevel::Medium,
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("none.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("nested").join("history.json"));
        let entries = vec![entry("2.2.2.2"), entry("1.1.1.1")];
        store.save(&entries).await.unwrap();
        assert_eq!(store.load().await.unwrap(), entries);
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));
        store.save(&[entry("1.1.1.1")]).await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.path().exists());
        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, br#"{"truncated"#).unwrap();
        let store = JsonFileHistoryStore::new(&path);

        assert!(store.load().await.unwrap().is_empty());

        store.save(&[entry("3.3.3.3")]).await.unwrap();
        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, "3.3.3.3");
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));
        store.save(&[entry("1.1.1.1")]).await.unwrap();
        store.save(&[entry("2.2.2.2"), entry("1.1.1.1")]).await.unwrap();

        assert!(!store.temp_path().exists());
        assert_eq!(store.load().await.unwrap().len(), 2);
    }
}
