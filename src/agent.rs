//! Named-tool surface for external agent runtimes.
//!
//! A fixed catalog mirrors the REST operations; each tool is invoked by
//! name with a keyword-argument map and returns its result serialized as
//! text. Failures come back as a structured `{"error": ...}` payload, never
//! as a transport error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    pub status: String,
    pub tool_name: String,
    /// Tool result serialized as pretty JSON text.
    pub result: String,
}

/// The fixed tool catalog offered to agent runtimes.
pub fn catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "get_weather",
            description: "Get current weather information for a city. Provides temperature, humidity, and weather conditions.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "Name of the city to get weather for (e.g., 'Pune', 'Mumbai', 'Delhi')"}
                },
                "required": ["city"]
            }),
        },
        ToolSpec {
            name: "get_market_price",
            description: "Get current market prices for a crop in a specific state. Returns modal, min, and max prices.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "crop": {"type": "string", "description": "Name of the crop (e.g., 'Tomato', 'Potato', 'Onion', 'Wheat')"},
                    "state": {"type": "string", "description": "State name (default: 'Maharashtra')", "default": "Maharashtra"}
                },
                "required": ["crop"]
            }),
        },
        ToolSpec {
            name: "get_soil_report",
            description: "Get soil health report for a field. Provides pH, NPK levels, and recommendations.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "field": {"type": "string", "description": "Field name (default: 'default')", "default": "default"}
                },
                "required": []
            }),
        },
        ToolSpec {
            name: "add_expense",
            description: "Add a new farming expense transaction for tracking.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Expense title/description (e.g., 'Fertilizer purchase', 'Seed cost')"},
                    "amount": {"type": "number", "description": "Amount in rupees"},
                    "type": {"type": "string", "description": "Expense type: 'expense' or 'income'"},
                    "date": {"type": "string", "description": "Date in YYYY-MM-DD format"}
                },
                "required": ["title", "amount", "type", "date"]
            }),
        },
        ToolSpec {
            name: "get_expenses",
            description: "Get list of all farming expenses and income transactions.",
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolSpec {
            name: "get_financial_summary",
            description: "Get financial summary with total income, expenses, and profit/loss.",
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolSpec {
            name: "get_crops",
            description: "Get list of all crops being grown with plot information.",
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolSpec {
            name: "add_crop",
            description: "Add a new crop to track with plot information.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "crop": {"type": "string", "description": "Crop name (e.g., 'Tomato', 'Rice', 'Wheat')"},
                    "plot": {"type": "string", "description": "Plot/field identifier (e.g., 'Field A', 'Plot 1')"}
                },
                "required": ["crop", "plot"]
            }),
        },
        ToolSpec {
            name: "delete_crop",
            description: "Delete a tracked crop by its list index.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "index": {"type": "integer", "description": "Stored-order index of the crop to delete"}
                },
                "required": ["index"]
            }),
        },
        ToolSpec {
            name: "ask_farming_question",
            description: "Ask a farming-related question to the AI chatbot. Get advice on crops, diseases, best practices, etc.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "Your farming question (e.g., 'What is the best fertilizer for tomatoes?', 'How to prevent pest attacks?')"}
                },
                "required": ["question"]
            }),
        },
    ]
}

/// Dispatch a tool call to the owning service and serialize the outcome.
pub async fn call(state: &AppState, request: &ToolCallRequest) -> ToolCallResponse {
    let name = request.tool_name.as_str();
    let args = &request.args;
    info!(tool_name = %name, "Dispatching agent tool call");

    let result = dispatch(state, name, args).await;
    let status = if result.get("error").is_some() {
        "error"
    } else {
        "ok"
    };

    ToolCallResponse {
        status: status.to_string(),
        tool_name: name.to_string(),
        result: serde_json::to_string_pretty(&result)
            .unwrap_or_else(|_| result.to_string()),
    }
}

async fn dispatch(state: &AppState, name: &str, args: &Value) -> Value {
    match name {
        "get_weather" => {
            let city = str_arg(args, "city").unwrap_or(&state.config.default_city);
            state.weather.lookup(city).await
        }
        "get_market_price" => {
            let Some(crop) = str_arg(args, "crop") else {
                return json!({"error": "crop is required"});
            };
            let market_state = str_arg(args, "state").unwrap_or(&state.config.default_state);
            state.prices.lookup(crop, market_state).await
        }
        "get_soil_report" => {
            let field = str_arg(args, "field").unwrap_or("default");
            state.soil.report(field).await
        }
        "add_expense" => {
            let (Some(title), Some(amount), Some(kind), Some(date)) = (
                str_arg(args, "title"),
                args.get("amount").and_then(|v| v.as_f64()),
                str_arg(args, "type"),
                str_arg(args, "date"),
            ) else {
                return json!({"error": "title, amount, type and date are required"});
            };
            state.expenses.add(title, amount, kind, date).await
        }
        "get_expenses" => {
            serde_json::to_value(state.expenses.list().await).unwrap_or(Value::Null)
        }
        "get_financial_summary" => {
            serde_json::to_value(state.expenses.summary().await).unwrap_or(Value::Null)
        }
        "get_crops" => serde_json::to_value(state.crops.list().await).unwrap_or(Value::Null),
        "add_crop" => {
            let (Some(crop), Some(plot)) = (str_arg(args, "crop"), str_arg(args, "plot")) else {
                return json!({"error": "crop and plot are required"});
            };
            state.crops.add(crop, plot).await
        }
        "delete_crop" => {
            let Some(index) = args.get("index").and_then(|v| v.as_i64()) else {
                return json!({"error": "index is required"});
            };
            state.crops.delete(index).await
        }
        "ask_farming_question" => {
            let Some(question) = str_arg(args, "question") else {
                return json!({"error": "question is required"});
            };
            json!({"answer": state.chat.answer(question).await})
        }
        _ => json!({"error": format!("Unknown tool: {name}")}),
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use uuid::Uuid;

    fn test_state() -> AppState {
        let data_dir =
            std::env::temp_dir().join(format!("kisan-agent-test-{}", Uuid::new_v4()));
        AppState::new(AppConfig {
            data_dir,
            openweather_key: None,
            agmarknet_key: String::new(),
            openrouter_key: None,
            llm_model: String::new(),
            default_state: "Maharashtra".into(),
            default_city: "Pune".into(),
            default_crop: "Tomato".into(),
            port: 0,
        })
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_error_payload() {
        let state = test_state();
        let response = call(
            &state,
            &ToolCallRequest {
                tool_name: "launch_tractor".into(),
                args: json!({}),
            },
        )
        .await;

        assert_eq!(response.status, "error");
        let result: Value = serde_json::from_str(&response.result).unwrap();
        assert_eq!(result["error"], "Unknown tool: launch_tractor");
    }

    #[tokio::test]
    async fn test_crop_lifecycle_through_tool_calls() {
        let state = test_state();

        let added = call(
            &state,
            &ToolCallRequest {
                tool_name: "add_crop".into(),
                args: json!({"crop": "Wheat", "plot": "Field A"}),
            },
        )
        .await;
        assert_eq!(added.status, "ok");

        let listed = call(
            &state,
            &ToolCallRequest {
                tool_name: "get_crops".into(),
                args: json!({}),
            },
        )
        .await;
        let crops: Value = serde_json::from_str(&listed.result).unwrap();
        assert_eq!(crops[0]["crop"], "Wheat");

        let deleted = call(
            &state,
            &ToolCallRequest {
                tool_name: "delete_crop".into(),
                args: json!({"index": 0}),
            },
        )
        .await;
        assert_eq!(deleted.status, "ok");
    }

    #[tokio::test]
    async fn test_financial_summary_tool_reflects_added_expenses() {
        let state = test_state();
        call(
            &state,
            &ToolCallRequest {
                tool_name: "add_expense".into(),
                args: json!({"title": "Sale", "amount": 1500.0, "type": "income", "date": "2026-08-01"}),
            },
        )
        .await;

        let summary = call(
            &state,
            &ToolCallRequest {
                tool_name: "get_financial_summary".into(),
                args: json!({}),
            },
        )
        .await;
        let result: Value = serde_json::from_str(&summary.result).unwrap();
        assert_eq!(result["profit"], 1500.0);
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_captured_not_propagated() {
        let state = test_state();
        let response = call(
            &state,
            &ToolCallRequest {
                tool_name: "get_market_price".into(),
                args: json!({}),
            },
        )
        .await;
        assert_eq!(response.status, "error");
        let result: Value = serde_json::from_str(&response.result).unwrap();
        assert_eq!(result["error"], "crop is required");
    }
}
