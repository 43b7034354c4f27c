//! Weather lookup with a local-cache fallback chain.
//!
//! Live OpenWeatherMap call when a key is configured, otherwise (or on any
//! live failure) a search of the seeded `weather.json` cache: exact city
//! match, then substring match, then the designated default entry. Only
//! when the whole chain misses does the caller see an `{error}` record.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::config::AppConfig;
use crate::store::JsonStore;

const OPENWEATHER_API_BASE: &str = "http://api.openweathermap.org/data/2.5/weather";

#[derive(Clone)]
pub struct WeatherService {
    client: reqwest::Client,
    store: JsonStore,
    api_key: Option<String>,
    default_city: String,
}

impl WeatherService {
    pub fn new(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            store: JsonStore::new(config.data_dir.clone()),
            api_key: config.openweather_key.clone(),
            default_city: config.default_city.clone(),
        }
    }

    /// Resolve a weather record for `city` through the fallback chain.
    /// A live hit is normalized to `{city, temp, humidity, weather}`; a
    /// cache hit is returned exactly as persisted.
    pub async fn lookup(&self, city: &str) -> Value {
        let Some(key) = self.api_key.clone() else {
            if let Some(local) = self.find_local(city).await {
                return local;
            }
            return json!({"error": "Missing OPENWEATHER_KEY in .env"});
        };

        match self.fetch_live(city, &key).await {
            Ok(record) => record,
            Err(reason) => {
                warn!(city = %city, error = %reason, "Live weather lookup failed, trying local cache");
                if let Some(local) = self.find_local(city).await {
                    return local;
                }
                json!({"error": reason})
            }
        }
    }

    async fn fetch_live(&self, city: &str, key: &str) -> Result<Value, String> {
        let response = self
            .client
            .get(OPENWEATHER_API_BASE)
            .query(&[("q", city), ("appid", key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| format!("weather request failed: {e}"))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("weather response parse failed: {e}"))?;

        // OpenWeather reports errors in-band: `cod` must be 200 (the field
        // arrives as a number on success and a string on error).
        if cod_value(&data) != Some(200) {
            let message = data
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("weather API error")
                .to_string();
            return Err(message);
        }

        let temp = data
            .pointer("/main/temp")
            .cloned()
            .ok_or_else(|| "weather payload missing main.temp".to_string())?;
        let humidity = data
            .pointer("/main/humidity")
            .cloned()
            .ok_or_else(|| "weather payload missing main.humidity".to_string())?;
        let description = data
            .pointer("/weather/0/description")
            .cloned()
            .ok_or_else(|| "weather payload missing description".to_string())?;

        Ok(json!({
            "city": city,
            "temp": temp,
            "humidity": humidity,
            "weather": description,
        }))
    }

    /// Cache search: exact (case-insensitive) city, then substring, then
    /// the `"default"` entry or the configured default city.
    async fn find_local(&self, city: &str) -> Option<Value> {
        let records: Vec<Value> = self.store.load_or_default("weather").await;
        let needle = city.trim().to_lowercase();

        let city_of =
            |r: &Value| -> String { str_field(r, "city").trim().to_lowercase() };

        if let Some(r) = records.iter().find(|r| city_of(r) == needle) {
            return Some((*r).clone());
        }
        if !needle.is_empty() {
            if let Some(r) = records.iter().find(|r| city_of(r).contains(&needle)) {
                return Some((*r).clone());
            }
        }

        let default_city = self.default_city.trim().to_lowercase();
        records
            .iter()
            .find(|r| {
                let c = city_of(r);
                c == "default" || c == default_city
            })
            .cloned()
    }
}

fn cod_value(data: &Value) -> Option<u64> {
    match data.get("cod") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn str_field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn service(data_dir: PathBuf) -> WeatherService {
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
        WeatherService::new(&config)
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("kisan-weather-test-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_no_key_and_empty_cache_returns_error_record() {
        let svc = service(scratch_dir());
        let result = svc.lookup("Atlantis").await;
        assert_eq!(result["error"], "Missing OPENWEATHER_KEY in .env");
    }

    #[tokio::test]
    async fn test_cache_match_precedence_exact_then_substring_then_default() {
        let dir = scratch_dir();
        let store = JsonStore::new(dir.clone());
        store
            .write(
                "weather",
                &json!([
                    {"city": "default", "temp": 20, "humidity": 50, "weather": "clear sky"},
                    {"city": "Navi Mumbai", "temp": 29, "humidity": 70, "weather": "haze"},
                    {"city": "Mumbai", "temp": 31, "humidity": 75, "weather": "scattered clouds"},
                ]),
            )
            .await
            .unwrap();
        let svc = service(dir);

        let exact = svc.lookup("mumbai").await;
        assert_eq!(exact["temp"], 31);

        let substring = svc.lookup("navi").await;
        assert_eq!(substring["temp"], 29);

        let fallback = svc.lookup("Atlantis").await;
        assert_eq!(fallback["temp"], 20);
    }

    #[tokio::test]
    async fn test_cache_hit_is_returned_verbatim() {
        let dir = scratch_dir();
        let store = JsonStore::new(dir.clone());
        store
            .write(
                "weather",
                &json!([{"city": "Nashik", "temp": 24.8, "humidity": 61, "weather": "haze", "note": "station 7"}]),
            )
            .await
            .unwrap();
        let svc = service(dir);

        let hit = svc.lookup("Nashik").await;
        assert_eq!(hit["note"], "station 7");
    }
}
