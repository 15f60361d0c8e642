// Market data domain
pub mod candle;
pub mod interval;

pub use candle::{Candle, CandleSeries, SeriesError};
pub use interval::Interval;
