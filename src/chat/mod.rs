//! Single-turn chatbot: classify the question, fetch from the matching
//! service, render a fixed template. Stateless per request.

pub mod llm;

use serde_json::Value;

use crate::config::AppConfig;
use crate::tools::{ExpenseLedger, FinanceSummary, PriceService, SoilService, WeatherService};
use llm::LlmClient;

/// Closed intent set. The model is asked for exactly one of these labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Weather,
    Price,
    Soil,
    Finance,
    CropAdvice,
    General,
}

impl Intent {
    /// The model may answer with more than the bare label, so matching is
    /// deliberately lenient: the first known label contained in the reply
    /// wins, in this fixed priority order.
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_lowercase();
        if l.contains("weather") {
            Self::Weather
        } else if l.contains("price") {
            Self::Price
        } else if l.contains("soil") {
            Self::Soil
        } else if l.contains("finance") {
            Self::Finance
        } else if l.contains("crop_advice") {
            Self::CropAdvice
        } else {
            Self::General
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    llm: LlmClient,
    weather: WeatherService,
    prices: PriceService,
    soil: SoilService,
    expenses: ExpenseLedger,
    default_city: String,
    default_crop: String,
    default_state: String,
}

impl ChatService {
    pub fn new(
        config: &AppConfig,
        weather: WeatherService,
        prices: PriceService,
        soil: SoilService,
        expenses: ExpenseLedger,
    ) -> Self {
        Self {
            llm: LlmClient::new(config),
            weather,
            prices,
            soil,
            expenses,
            default_city: config.default_city.clone(),
            default_crop: config.default_crop.clone(),
            default_state: config.default_state.clone(),
        }
    }

    /// Answer a free-text question: classify, fetch, render. A lookup
    /// result carrying an `error` field surfaces that error as the answer.
    pub async fn answer(&self, question: &str) -> String {
        match self.detect_intent(question).await {
            Intent::Weather => {
                let city = self.extract_city(question).await;
                let data = self.weather.lookup(&city).await;
                match data.get("error") {
                    Some(err) => display(err),
                    None => format_weather(&city, &data),
                }
            }
            Intent::Price => {
                let crop = self.extract_crop(question).await;
                let data = self.prices.lookup(&crop, &self.default_state).await;
                match data.get("error") {
                    Some(err) => display(err),
                    None => format_price(&data),
                }
            }
            Intent::Soil => {
                let data = self.soil.report("default").await;
                match data.get("error") {
                    Some(err) => display(err),
                    None => format_soil(&data),
                }
            }
            Intent::Finance => format_finance(&self.expenses.summary().await),
            Intent::CropAdvice => {
                self.llm
                    .ask(&format!(
                        "Give practical crop advice for a farmer: {question}. \
                         Keep it short and in simple language."
                    ))
                    .await
            }
            Intent::General => {
                self.llm
                    .ask(&format!(
                        "You are KisanAI. Explain answer simply for farmers: {question}"
                    ))
                    .await
            }
        }
    }

    /// One-sentence dashboard tip from compact weather/price summaries.
    pub async fn dashboard_insight(&self, weather: &str, prices: &str) -> String {
        self.llm
            .ask(&format!(
                "Generate a 1-sentence farming tip based on this data:\n\
                 Weather: {weather}\n\
                 Prices: {prices}\n\n\
                 Keep it practical and actionable for an Indian farmer."
            ))
            .await
    }

    async fn detect_intent(&self, question: &str) -> Intent {
        let prompt = format!(
            "Classify the intent of this question into one word:\n\
             - weather\n\
             - price\n\
             - soil\n\
             - finance\n\
             - crop_advice\n\
             - general\n\n\
             Question: \"{question}\"\n\n\
             ONLY return one word."
        );
        Intent::from_label(&self.llm.ask(&prompt).await)
    }

    async fn extract_city(&self, question: &str) -> String {
        let prompt = format!(
            "Extract the city name from: \"{question}\"\n\
             If none found, return \"{}\".\n\
             ONLY return the city.",
            self.default_city
        );
        self.llm.ask(&prompt).await.trim().to_string()
    }

    async fn extract_crop(&self, question: &str) -> String {
        let prompt = format!(
            "Extract the crop name from: \"{question}\"\n\
             ONLY return the crop. If not found, return \"{}\".",
            self.default_crop
        );
        self.llm.ask(&prompt).await.trim().to_string()
    }
}

fn format_weather(city: &str, data: &Value) -> String {
    format!(
        "\n🌦 **Weather Update – {city}**\n\
         Temperature: **{}°C**\n\
         Humidity: **{}%**\n\
         Sky: **{}**\n\n\
         ✅ Good time for outdoor farm work if rain chance is low.\n",
        field(data, "temp"),
        field(data, "humidity"),
        title_case(&field(data, "weather")),
    )
}

fn format_price(data: &Value) -> String {
    let crop = ["crop", "commodity"]
        .iter()
        .find_map(|k| data.get(*k).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or("Crop");
    let state = data.get("state").and_then(|v| v.as_str()).unwrap_or("State");
    format!(
        "\n📈 **Market Price for {crop} – {state}**\n\
         Market: **{}**\n\
         Min: **₹{}**\n\
         Max: **₹{}**\n\n\
         ✅ Compare local mandi rates to get best deal.\n",
        field_or(data, "market", "N/A"),
        field_or(data, "min_price", "N/A"),
        field_or(data, "max_price", "N/A"),
    )
}

fn format_soil(data: &Value) -> String {
    format!(
        "\n🧪 **Soil Report**\n\
         Soil Type: **{}**\n\
         pH: **{}**\n\
         Moisture: **{}**\n\
         N: **{}**\n\
         P: **{}**\n\
         K: **{}**\n\
         Last Tested: **{}**\n\n\
         ✅ Soil looks healthy. Moderate fertilization recommended.\n",
        field(data, "soil_type"),
        field(data, "ph"),
        field(data, "moisture"),
        field(data, "nitrogen"),
        field(data, "phosphorus"),
        field(data, "potassium"),
        field(data, "last_tested"),
    )
}

fn format_finance(summary: &FinanceSummary) -> String {
    format!(
        "\n💰 **Farm Finance Summary**\n\
         Income: **₹{}**\n\
         Expenses: **₹{}**\n\
         Profit: **₹{}**\n\n\
         ✅ Track weekly to avoid losses.\n",
        amount(summary.total_income),
        amount(summary.total_expense),
        amount(summary.profit),
    )
}

/// Render a JSON field for a template without surrounding quotes.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field(data: &Value, key: &str) -> String {
    data.get(key).map(display).unwrap_or_default()
}

fn field_or(data: &Value, key: &str, default: &str) -> String {
    match data.get(key) {
        Some(Value::Null) | None => default.to_string(),
        Some(v) => display(v),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
