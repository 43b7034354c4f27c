pub mod crops;
pub mod expenses;
pub mod prices;
pub mod soil;
pub mod weather;

pub use crops::{Crop, CropTracker};
pub use expenses::{Expense, ExpenseLedger, FinanceSummary};
pub use prices::PriceService;
pub use soil::SoilService;
pub use weather::WeatherService;
