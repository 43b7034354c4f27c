//! REST surface: stateless pass-throughs to the lookup and domain services.
//!
//! Invalid caller input (missing required fields, bad index) is the only
//! client-error case; every upstream failure has already been absorbed by
//! the fallback chains and arrives here as a domain-shaped `{error}` value.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agent::{self, ToolCallRequest, ToolCallResponse, ToolSpec};
use crate::tools::{Crop, Expense, FinanceSummary};
use crate::AppState;

const SERVICE_NAME: &str = "kisan-backend";
const VERSION: &str = env!("CARGO_PKG_VERSION");

type ClientError = (StatusCode, Json<Value>);

fn bad_request(detail: &str) -> ClientError {
    (StatusCode::BAD_REQUEST, Json(json!({"detail": detail})))
}

async fn home() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "ok",
        "version": VERSION,
    }))
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: String,
}

async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Json<Value> {
    Json(state.weather.lookup(&query.city).await)
}

#[derive(Debug, Deserialize)]
struct PriceQuery {
    crop: String,
    state: Option<String>,
}

async fn price(State(state): State<AppState>, Query(query): Query<PriceQuery>) -> Json<Value> {
    let market_state = query
        .state
        .unwrap_or_else(|| state.config.default_state.clone());
    Json(state.prices.lookup(&query.crop, &market_state).await)
}

#[derive(Debug, Deserialize)]
struct SoilQuery {
    #[serde(default = "default_field")]
    field: String,
}

fn default_field() -> String {
    "default".to_string()
}

async fn soil(State(state): State<AppState>, Query(query): Query<SoilQuery>) -> Json<Value> {
    Json(state.soil.report(&query.field).await)
}

async fn soil_add(State(state): State<AppState>, Json(body): Json<Value>) -> Json<Value> {
    let field = body
        .get("field")
        .and_then(|v| v.as_str())
        .unwrap_or("default");
    let num = |key: &str, default: f64| body.get(key).and_then(|v| v.as_f64()).unwrap_or(default);
    let soil_type = body
        .get("soil_type")
        .and_then(|v| v.as_str())
        .unwrap_or("Loam");

    Json(
        state
            .soil
            .add_report(
                field,
                num("ph", 7.0),
                num("nitrogen", 0.0),
                num("phosphorus", 0.0),
                num("potassium", 0.0),
                num("moisture", 0.0),
                soil_type,
            )
            .await,
    )
}

#[derive(Debug, Deserialize)]
struct ExpenseAddQuery {
    title: String,
    amount: f64,
    #[serde(rename = "type")]
    kind: String,
    date: String,
}

async fn expense_add(
    State(state): State<AppState>,
    Query(query): Query<ExpenseAddQuery>,
) -> Json<Value> {
    Json(
        state
            .expenses
            .add(&query.title, query.amount, &query.kind, &query.date)
            .await,
    )
}

async fn expense_list(State(state): State<AppState>) -> Json<Vec<Expense>> {
    Json(state.expenses.list().await)
}

async fn expense_summary(State(state): State<AppState>) -> Json<FinanceSummary> {
    Json(state.expenses.summary().await)
}

async fn crops_list(State(state): State<AppState>) -> Json<Vec<Crop>> {
    Json(state.crops.list().await)
}

async fn crops_add(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ClientError> {
    let crop = body.get("crop").and_then(|v| v.as_str()).unwrap_or("");
    let plot = body.get("plot").and_then(|v| v.as_str()).unwrap_or("");
    if crop.is_empty() || plot.is_empty() {
        return Err(bad_request("crop and plot are required"));
    }
    Ok(Json(state.crops.add(crop, plot).await))
}

async fn crops_delete(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ClientError> {
    let Some(index) = body.get("index").and_then(|v| v.as_i64()) else {
        return Err(bad_request("index is required"));
    };
    Ok(Json(state.crops.delete(index).await))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    question: String,
}

async fn chatbot(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<Value> {
    info!(question = %req.question, "Chatbot query");
    let answer = state.chat.answer(&req.question).await;
    Json(json!({"answer": answer}))
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    city: Option<String>,
    crop: Option<String>,
}

async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Json<Value> {
    let city = query
        .city
        .unwrap_or_else(|| state.config.default_city.clone());
    let crop = query
        .crop
        .unwrap_or_else(|| state.config.default_crop.clone());

    let weather = state.weather.lookup(&city).await;
    let price = state
        .prices
        .lookup(&crop, &state.config.default_state)
        .await;
    let crops = state.crops.list().await;
    let financials = state.expenses.summary().await;

    Json(json!({
        "weather": weather,
        "price": price,
        "crop_count": crops.len(),
        "crops": crops,
        "financials": financials,
    }))
}

async fn dashboard_insight(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Json<Value> {
    let city = query
        .city
        .unwrap_or_else(|| state.config.default_city.clone());
    let crop = query
        .crop
        .unwrap_or_else(|| state.config.default_crop.clone());

    let weather = state.weather.lookup(&city).await;
    let price = state
        .prices
        .lookup(&crop, &state.config.default_state)
        .await;

    let weather_summary = if weather.get("error").is_none() {
        format!(
            "{}C, {}",
            weather.get("temp").map(display).unwrap_or_else(|| "25".into()),
            weather
                .get("weather")
                .map(display)
                .unwrap_or_else(|| "Clear".into()),
        )
    } else {
        "Unknown".to_string()
    };
    let price_summary = if price.get("error").is_none() {
        format!(
            "{}: {}",
            price
                .get("crop")
                .map(display)
                .unwrap_or_else(|| crop.clone()),
            price
                .get("modal_price")
                .map(display)
                .unwrap_or_else(|| "N/A".into()),
        )
    } else {
        "Unknown".to_string()
    };

    let insight = state
        .chat
        .dashboard_insight(&weather_summary, &price_summary)
        .await;
    Json(json!({"insight": insight}))
}

async fn agent_tools() -> Json<Vec<ToolSpec>> {
    Json(agent::catalog())
}

async fn agent_call(
    State(state): State<AppState>,
    Json(req): Json<ToolCallRequest>,
) -> Json<ToolCallResponse> {
    Json(agent::call(&state, &req).await)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Assemble the full route table over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/weather", get(weather))
        .route("/price", get(price))
        .route("/soil", get(soil))
        .route("/soil/add", post(soil_add))
        .route("/expense/add", get(expense_add))
        .route("/expense/list", get(expense_list))
        .route("/expense/summary", get(expense_summary))
        .route("/crops", get(crops_list))
        .route("/crops/add", post(crops_add))
        .route("/crops/delete", post(crops_delete))
        .route("/chatbot", post(chatbot))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/insight", get(dashboard_insight))
        .route("/agent/tools", get(agent_tools))
        .route("/agent/call", post(agent_call))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
