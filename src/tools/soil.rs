//! Soil reports, keyed by field name in one JSON map. No external API.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::config::AppConfig;
use crate::store::JsonStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoilReport {
    pub ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub moisture: f64,
    pub soil_type: String,
    pub last_tested: String,
}

#[derive(Clone)]
pub struct SoilService {
    store: JsonStore,
}

impl SoilService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: JsonStore::new(config.data_dir.clone()),
        }
    }

    /// Report for `field`, falling back to the `"default"` field, else an
    /// explicit error record.
    pub async fn report(&self, field: &str) -> Value {
        let soil: Map<String, Value> = self.store.load_or_default("soil").await;

        if let Some(report) = soil.get(field) {
            return report.clone();
        }
        if let Some(report) = soil.get("default") {
            return report.clone();
        }
        json!({"error": "No soil data"})
    }

    /// Upsert the report for `field`, stamping `last_tested` with today.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_report(
        &self,
        field: &str,
        ph: f64,
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
        moisture: f64,
        soil_type: &str,
    ) -> Value {
        let mut soil: Map<String, Value> = self.store.load_or_default("soil").await;

        let report = SoilReport {
            ph,
            nitrogen,
            phosphorus,
            potassium,
            moisture,
            soil_type: soil_type.to_string(),
            last_tested: Local::now().format("%d %b %Y").to_string(),
        };
        let report_value = serde_json::to_value(&report).unwrap_or(Value::Null);
        soil.insert(field.to_string(), report_value.clone());

        if let Err(e) = self.store.write("soil", &soil).await {
            warn!(field = %field, error = %e, "Failed to persist soil report");
            return json!({"error": "Failed to save soil data"});
        }

        json!({
            "status": "success",
            "message": "Soil report saved",
            "data": report_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("kisan-soil-test-{}", Uuid::new_v4()))
    }

    fn service(data_dir: PathBuf) -> SoilService {
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
        SoilService::new(&config)
    }

    #[tokio::test]
    async fn test_untracked_field_falls_back_to_default_report() {
        let svc = service(scratch_dir());
        svc.add_report("default", 6.8, 42.0, 28.5, 35.0, 21.0, "Loam")
            .await;

        let report = svc.report("west-field").await;
        assert_eq!(report["soil_type"], "Loam");
    }

    #[tokio::test]
    async fn test_no_data_at_all_returns_error() {
        let svc = service(scratch_dir());
        let report = svc.report("west-field").await;
        assert_eq!(report["error"], "No soil data");
    }

    #[tokio::test]
    async fn test_add_report_overwrites_existing_field() {
        let svc = service(scratch_dir());
        svc.add_report("north", 6.2, 30.0, 20.0, 25.0, 18.0, "Clay")
            .await;
        let outcome = svc
            .add_report("north", 7.1, 45.0, 33.0, 40.0, 24.0, "Sandy Loam")
            .await;

        assert_eq!(outcome["status"], "success");
        let report = svc.report("north").await;
        assert_eq!(report["ph"], 7.1);
        assert_eq!(report["soil_type"], "Sandy Loam");
    }
}
