pub mod forecast_csv;

pub use forecast_csv::{export_forecast, forecast_to_csv_string, write_forecast};
