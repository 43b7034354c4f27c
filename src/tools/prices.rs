//! Market-price lookup against the data.gov.in Agmarknet resource.
//!
//! Any live failure (status, transport, empty record set) falls back to the
//! seeded `prices.json` cache before surfacing an `{error}` record. A live
//! hit also carries a 7-day `history` series; that series is SYNTHETIC,
//! jittered ±10% around the modal price for display only, because the
//! upstream API exposes no historical data.

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::config::AppConfig;
use crate::store::JsonStore;

const AGMARKNET_RESOURCE: &str =
    "https://api.data.gov.in/resource/35985678-0d79-46b4-9ed6-6f13308a1d24";

const RECORD_LIMIT: &str = "5";

#[derive(Clone)]
pub struct PriceService {
    client: reqwest::Client,
    store: JsonStore,
    api_key: String,
}

impl PriceService {
    pub fn new(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            store: JsonStore::new(config.data_dir.clone()),
            api_key: config.agmarknet_key.clone(),
        }
    }

    /// Resolve a price record for `commodity` in `state` through the
    /// fallback chain: live API, local cache, `{error}` record.
    pub async fn lookup(&self, commodity: &str, state: &str) -> Value {
        let response = match self
            .client
            .get(AGMARKNET_RESOURCE)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("format", "json"),
                ("filters[Commodity]", commodity),
                ("filters[State]", state),
                ("limit", RECORD_LIMIT),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(commodity = %commodity, state = %state, error = %e, "Price request failed, trying local cache");
                return match self.find_local(commodity, state).await {
                    Some(local) => local,
                    None => json!({
                        "crop": commodity,
                        "state": state,
                        "modal_price": "N/A",
                        "error": e.to_string(),
                    }),
                };
            }
        };

        if !response.status().is_success() {
            let code = response.status().as_u16();
            warn!(commodity = %commodity, state = %state, status = code, "Price API returned non-success, trying local cache");
            return match self.find_local(commodity, state).await {
                Some(local) => local,
                None => json!({
                    "crop": commodity,
                    "state": state,
                    "error": format!("API returned status code {code}"),
                }),
            };
        }

        let data: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(commodity = %commodity, state = %state, error = %e, "Price response parse failed, trying local cache");
                return match self.find_local(commodity, state).await {
                    Some(local) => local,
                    None => json!({
                        "crop": commodity,
                        "state": state,
                        "modal_price": "N/A",
                        "error": e.to_string(),
                    }),
                };
            }
        };

        let record = data
            .get("records")
            .and_then(|r| r.as_array())
            .and_then(|a| a.first());

        let Some(record) = record else {
            return match self.find_local(commodity, state).await {
                Some(local) => local,
                None => json!({
                    "crop": commodity,
                    "state": state,
                    "error": "No data found for the given commodity and state",
                }),
            };
        };

        let mut result = json!({
            "crop": commodity,
            "state": state,
            "district": record.get("district").cloned().unwrap_or(Value::Null),
            "market": record.get("market").cloned().unwrap_or(Value::Null),
            "modal_price": record.get("modal_price").cloned().unwrap_or(Value::Null),
            "min_price": record.get("min_price").cloned().unwrap_or(Value::Null),
            "max_price": record.get("max_price").cloned().unwrap_or(Value::Null),
            "arrival_date": record.get("arrival_date").cloned().unwrap_or(Value::Null),
            "variety": record.get("variety").cloned().unwrap_or(Value::Null),
        });

        if let Some(modal) = price_as_f64(record.get("modal_price")) {
            let mut rng = StdRng::from_entropy();
            result["history"] = Value::Array(synthesize_history(
                modal,
                Local::now().date_naive(),
                &mut rng,
            ));
        }

        result
    }

    /// Cache search: exact commodity match, narrowed by state when any
    /// candidate matches it, else substring match. The first candidate is
    /// normalized and tagged `"source": "local"`; no history is attached.
    async fn find_local(&self, commodity: &str, state: &str) -> Option<Value> {
        let records: Vec<Value> = self.store.load_or_default("prices").await;
        let crop_l = commodity.trim().to_lowercase();
        let state_l = state.trim().to_lowercase();

        let crop_of = |r: &Value| str_field(r, "crop").trim().to_lowercase();
        let state_of = |r: &Value| str_field(r, "state").trim().to_lowercase();

        let mut candidates: Vec<&Value> =
            records.iter().filter(|r| crop_of(r) == crop_l).collect();

        if !state_l.is_empty() {
            let narrowed: Vec<&Value> = candidates
                .iter()
                .copied()
                .filter(|r| state_of(r) == state_l)
                .collect();
            if !narrowed.is_empty() {
                candidates = narrowed;
            }
        }

        if candidates.is_empty() && !crop_l.is_empty() {
            candidates = records
                .iter()
                .filter(|r| crop_of(r).contains(&crop_l))
                .collect();
        }

        let r = candidates.first()?;
        Some(json!({
            "crop": r.get("crop").cloned().unwrap_or_else(|| Value::String(commodity.to_string())),
            "state": r.get("state").cloned().unwrap_or_else(|| Value::String(state.to_string())),
            "district": r.get("district").cloned().unwrap_or(Value::Null),
            "market": r.get("market").cloned().unwrap_or(Value::Null),
            "modal_price": r.get("modal_price").cloned().unwrap_or(Value::Null),
            "min_price": r.get("min_price").cloned().unwrap_or(Value::Null),
            "max_price": r.get("max_price").cloned().unwrap_or(Value::Null),
            "arrival_date": r.get("arrival_date").cloned().unwrap_or(Value::Null),
            "variety": r.get("variety").cloned().unwrap_or(Value::Null),
            "source": "local",
        }))
    }
}

/// Build the display-only 7-day series: one entry per day ending today,
/// each an integer price within ±10% of the modal price. The jitter source
/// is injected so tests can assert the bounds with a seeded generator.
pub fn synthesize_history(modal_price: f64, today: NaiveDate, rng: &mut impl Rng) -> Vec<Value> {
    (0..7)
        .rev()
        .map(|i| {
            let date = today - ChronoDuration::days(i);
            let jitter: f64 = rng.gen_range(-0.1..=0.1);
            json!({
                "date": date.format("%d %b").to_string(),
                "price": (modal_price * (1.0 + jitter)) as i64,
            })
        })
        .collect()
}

/// Agmarknet serves prices as strings; the local cache may hold numbers.
fn price_as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn str_field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(|v| v.as_str()).unwrap_or("")
}
