// Candles, intervals and series
pub mod market;

// Derived indicator values
pub mod indicators;

// Forecast output
pub mod forecast;

// Headlines and sentiment
pub mod news;
pub mod sentiment;

// Refresh loop configuration and state
pub mod refresh;

// Port interfaces
pub mod ports;

// Market data integrity checks
pub mod validation;

// Domain-specific error types
pub mod errors;
