pub mod binance;
pub mod core;
pub mod mock;
pub mod news;

pub use binance::BinanceMarketDataClient;
pub use mock::MockMarketDataClient;
