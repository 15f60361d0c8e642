// Market data processing modules
pub mod indicator_engine;

pub use indicator_engine::{IndicatorConfig, IndicatorEngine};
