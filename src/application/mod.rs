// Indicator computation over candle series
pub mod market_data;

// Forecasting models
pub mod ml;

// Forecast export (CSV)
pub mod export;

// Refresh orchestration
pub mod refresh;
