//! Crop tracking: append/remove over the flat crops list.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::config::AppConfig;
use crate::store::JsonStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Crop {
    pub crop: String,
    pub plot: String,
    pub sown_date: String,
    pub stage: String,
    pub progress: u32,
}

#[derive(Clone)]
pub struct CropTracker {
    store: JsonStore,
}

impl CropTracker {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: JsonStore::new(config.data_dir.clone()),
        }
    }

    /// All tracked crops, newest first.
    pub async fn list(&self) -> Vec<Crop> {
        let mut crops: Vec<Crop> = self.store.load_or_default("crops").await;
        crops.reverse();
        crops
    }

    /// Append a crop with a server-assigned sown date and initial stage.
    pub async fn add(&self, crop: &str, plot: &str) -> Value {
        let mut crops: Vec<Crop> = self.store.load_or_default("crops").await;

        let record = Crop {
            crop: crop.to_string(),
            plot: plot.to_string(),
            sown_date: Local::now().format("%d %b %Y").to_string(),
            stage: "Sown".to_string(),
            progress: 0,
        };
        crops.push(record.clone());

        if let Err(e) = self.store.write("crops", &crops).await {
            warn!(crop = %crop, error = %e, "Failed to persist crops");
            return json!({"error": "Failed to save crop data"});
        }

        json!({
            "status": "success",
            "message": "Crop added",
            "data": record,
        })
    }

    /// Remove a crop by stored-order index. An out-of-range index is an
    /// error and leaves the list untouched.
    pub async fn delete(&self, index: i64) -> Value {
        let mut crops: Vec<Crop> = self.store.load_or_default("crops").await;

        if index < 0 || index as usize >= crops.len() {
            return json!({"error": "Invalid crop index"});
        }

        let removed = crops.remove(index as usize);

        if let Err(e) = self.store.write("crops", &crops).await {
            warn!(index = index, error = %e, "Failed to persist crops");
            return json!({"error": "Failed to save crop data"});
        }

        json!({
            "status": "success",
            "message": "Crop deleted",
            "data": removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("kisan-crops-test-{}", Uuid::new_v4()))
    }

    fn tracker(data_dir: PathBuf) -> CropTracker {
        let config = AppConfig {
            data_dir,
            openweather_key: None,
            agmarknet_key: String::new(),
            openrouter_key: None,
            llm_model: String::new(),
            default_state: "Maharashtra".into(),
            default_city: "Pune".into(),
            default_crop: "Tomato".into(),
            port: 0,
        };
        CropTracker::new(&config)
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let tracker = tracker(scratch_dir());
        tracker.add("Wheat", "Plot 1").await;
        tracker.add("Rice", "Plot 2").await;

        let crops = tracker.list().await;
        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].crop, "Rice");
        assert_eq!(crops[1].crop, "Wheat");
        assert_eq!(crops[0].stage, "Sown");
        assert_eq!(crops[0].progress, 0);
    }

    #[tokio::test]
    async fn test_delete_out_of_range_leaves_list_unchanged() {
        let tracker = tracker(scratch_dir());
        tracker.add("Wheat", "Plot 1").await;

        let too_big = tracker.delete(5).await;
        assert_eq!(too_big["error"], "Invalid crop index");

        let negative = tracker.delete(-1).await;
        assert_eq!(negative["error"], "Invalid crop index");

        assert_eq!(tracker.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_by_stored_order_index() {
        let tracker = tracker(scratch_dir());
        tracker.add("Wheat", "Plot 1").await;
        tracker.add("Rice", "Plot 2").await;

        let outcome = tracker.delete(0).await;
        assert_eq!(outcome["status"], "success");
        assert_eq!(outcome["data"]["crop"], "Wheat");

        let remaining = tracker.list().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].crop, "Rice");
    }
}
