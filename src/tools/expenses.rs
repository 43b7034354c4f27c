//! Expense ledger: append-only income/expense records with derived views.
//!
//! Records are never updated or deleted. The summary is recomputed from the
//! stored list on every call, so there is no cached total to drift.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::config::AppConfig;
use crate::store::JsonStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expense {
    pub title: String,
    pub amount: f64,
    /// `"income"` adds to income; anything else counts as expense.
    #[serde(rename = "type")]
    pub kind: String,
    /// Display date (`%d %b %Y` when the input parsed).
    pub date: String,
    /// ISO sort key (`%Y-%m-%d`); absent when the input date was unparsable.
    pub ts: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub profit: f64,
}

#[derive(Clone)]
pub struct ExpenseLedger {
    store: JsonStore,
}

impl ExpenseLedger {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: JsonStore::new(config.data_dir.clone()),
        }
    }

    /// Append a transaction. The input date is normalized best-effort: an
    /// unrecognized format is kept verbatim for display with no sort key.
    pub async fn add(&self, title: &str, amount: f64, kind: &str, date: &str) -> Value {
        let mut expenses: Vec<Expense> = self.store.load_or_default("expenses").await;

        let (display_date, ts) = normalize_date(date);
        let record = Expense {
            title: title.to_string(),
            amount,
            kind: kind.to_string(),
            date: display_date,
            ts,
        };
        expenses.push(record.clone());

        if let Err(e) = self.store.write("expenses", &expenses).await {
            warn!(title = %title, error = %e, "Failed to persist expenses");
            return json!({"error": "Failed to save expense data"});
        }

        json!({
            "status": "success",
            "message": "Expense added",
            "data": record,
        })
    }

    /// All transactions, latest first. Records without a usable date sort
    /// with an empty key, i.e. after every dated record.
    pub async fn list(&self) -> Vec<Expense> {
        let mut expenses: Vec<Expense> = self.store.load_or_default("expenses").await;
        expenses.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        expenses
    }

    /// Totals recomputed from the stored list.
    pub async fn summary(&self) -> FinanceSummary {
        let expenses: Vec<Expense> = self.store.load_or_default("expenses").await;

        let mut total_income = 0.0;
        let mut total_expense = 0.0;
        for e in &expenses {
            if e.kind == "income" {
                total_income += e.amount;
            } else {
                total_expense += e.amount;
            }
        }

        FinanceSummary {
            total_income,
            total_expense,
            profit: total_income - total_expense,
        }
    }
}

fn normalize_date(raw: &str) -> (String, Option<String>) {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return (
            d.format("%d %b %Y").to_string(),
            Some(d.format("%Y-%m-%d").to_string()),
        );
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%d %b %Y") {
        return (raw.to_string(), Some(d.format("%Y-%m-%d").to_string()));
    }
    (raw.to_string(), None)
}

fn sort_key(e: &Expense) -> String {
    if let Some(ts) = &e.ts {
        if !ts.is_empty() {
            return ts.clone();
        }
    }
    for fmt in ["%d %b %Y", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(&e.date, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("kisan-expenses-test-{}", Uuid::new_v4()))
    }

    fn ledger(data_dir: PathBuf) -> ExpenseLedger {
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
        ExpenseLedger::new(&config)
    }

    #[tokio::test]
    async fn test_list_sorts_latest_first_regardless_of_insertion_order() {
        let ledger = ledger(scratch_dir());
        ledger.add("Seeds", 500.0, "expense", "2024-01-01").await;
        ledger.add("Harvest sale", 9000.0, "income", "2024-03-01").await;
        ledger.add("Fertilizer", 1200.0, "expense", "2024-02-01").await;

        let dates: Vec<String> = ledger
            .list()
            .await
            .into_iter()
            .map(|e| e.ts.unwrap_or_default())
            .collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    }

    #[tokio::test]
    async fn test_summary_recomputes_profit_after_every_addition() {
        let ledger = ledger(scratch_dir());
        ledger.add("Sale", 1000.0, "income", "2024-01-05").await;

        let first = ledger.summary().await;
        assert_eq!(first.profit, 1000.0);

        ledger.add("Diesel", 300.0, "expense", "2024-01-06").await;
        ledger.add("Labour", 450.0, "expense", "2024-01-07").await;

        let second = ledger.summary().await;
        assert_eq!(second.total_income, 1000.0);
        assert_eq!(second.total_expense, 750.0);
        assert_eq!(second.profit, second.total_income - second.total_expense);
    }

    #[tokio::test]
    async fn test_display_date_form_is_accepted_and_back_converted() {
        let ledger = ledger(scratch_dir());
        ledger.add("Pump repair", 700.0, "expense", "15 Jan 2024").await;

        let listed = ledger.list().await;
        assert_eq!(listed[0].date, "15 Jan 2024");
        assert_eq!(listed[0].ts.as_deref(), Some("2024-01-15"));
    }

    #[tokio::test]
    async fn test_unparsable_date_is_kept_with_no_sort_key() {
        let ledger = ledger(scratch_dir());
        ledger.add("Misc", 50.0, "expense", "sometime last week").await;
        ledger.add("Sale", 2000.0, "income", "2024-02-01").await;

        let listed = ledger.list().await;
        assert_eq!(listed[0].ts.as_deref(), Some("2024-02-01"));
        assert_eq!(listed[1].date, "sometime last week");
        assert!(listed[1].ts.is_none());
    }
}
