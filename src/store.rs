//! Flat-file JSON persistence.
//!
//! One document per domain under the configured data directory. Loads fail
//! soft: a missing, corrupt, or wrongly-shaped file yields the empty value
//! (with the reason logged) so request handlers never surface a filesystem
//! error. Writes rewrite the whole file through a temp-file rename; last
//! writer wins, which is acceptable for the single-user deployment target.

use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    /// Read and deserialize `<data_dir>/<name>.json`, or return the default
    /// value when the file is absent or does not parse into `T`.
    pub async fn load_or_default<T>(&self, name: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(name);
        if tokio::fs::metadata(&path).await.is_err() {
            return T::default();
        }

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read store file, using default");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse store file, using default");
                T::default()
            }
        }
    }

    /// Overwrite `<data_dir>/<name>.json` with the serialized collection.
    pub async fn write<T>(&self, name: &str, value: &T) -> Result<(), String>
    where
        T: Serialize,
    {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| format!("failed to create data dir {}: {e}", self.data_dir.display()))?;

        let path = self.path(name);
        let tmp_path = self
            .data_dir
            .join(format!("{name}.json.tmp-{}", Uuid::new_v4()));

        let raw = serde_json::to_string_pretty(value)
            .map_err(|e| format!("failed to serialize {name}: {e}"))?;

        tokio::fs::write(&tmp_path, raw)
            .await
            .map_err(|e| format!("failed to write temp file {}: {e}", tmp_path.display()))?;

        // Best-effort atomic replace. On Windows, rename won't overwrite the
        // destination, so we remove first.
        let _ = tokio::fs::remove_file(&path).await;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| format!("failed to replace store file {}: {e}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn scratch_store() -> JsonStore {
        let dir = std::env::temp_dir().join(format!("kisan-store-test-{}", Uuid::new_v4()));
        JsonStore::new(dir)
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_default() {
        let store = scratch_store();
        let records: Vec<Value> = store.load_or_default("weather").await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_returns_default() {
        let store = scratch_store();
        tokio::fs::create_dir_all(store.data_dir.clone()).await.unwrap();
        tokio::fs::write(store.path("crops"), "{not json at all")
            .await
            .unwrap();
        let records: Vec<Value> = store.load_or_default("crops").await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_returns_default() {
        let store = scratch_store();
        store
            .write("expenses", &serde_json::json!({"not": "a list"}))
            .await
            .unwrap();
        let records: Vec<Value> = store.load_or_default("expenses").await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_write_creates_data_dir_and_persists() {
        let store = scratch_store();
        store
            .write("soil", &serde_json::json!({"default": {"ph": 6.5}}))
            .await
            .unwrap();
        let map: serde_json::Map<String, Value> = store.load_or_default("soil").await;
        assert_eq!(map["default"]["ph"], 6.5);
    }
}
