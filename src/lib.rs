//! KisanAI backend: farming-assistant services behind a REST surface and
//! an agent tool-calling surface.
//!
//! Each lookup service wraps one external API with a local JSON-cache
//! fallback chain; crop and expense tracking are pure flat-file CRUD; the
//! chatbot routes free-text questions through an OpenRouter client that
//! degrades to deterministic mock answers when no credential is configured.

pub mod agent;
pub mod api;
pub mod chat;
pub mod config;
pub mod store;
pub mod tools;

use chat::ChatService;
use config::AppConfig;
use tools::{CropTracker, ExpenseLedger, PriceService, SoilService, WeatherService};

/// Shared per-process state: the startup configuration plus one instance of
/// each service, constructed once and cloned into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub weather: WeatherService,
    pub prices: PriceService,
    pub soil: SoilService,
    pub crops: CropTracker,
    pub expenses: ExpenseLedger,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let weather = WeatherService::new(&config);
        let prices = PriceService::new(&config);
        let soil = SoilService::new(&config);
        let crops = CropTracker::new(&config);
        let expenses = ExpenseLedger::new(&config);
        let chat = ChatService::new(
            &config,
            weather.clone(),
            prices.clone(),
            soil.clone(),
            expenses.clone(),
        );

        Self {
            config,
            weather,
            prices,
            soil,
            crops,
            expenses,
            chat,
        }
    }
}
