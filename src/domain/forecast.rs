use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    pub fn half_width(&self) -> f64 {
        (self.upper - self.lower) / 2.0
    }
}

/// Model output for one symbol: the in-sample fit over the history tail
/// followed by one point per requested future day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub symbol: String,
    history: Vec<ForecastPoint>,
    future: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn new(
        symbol: impl Into<String>,
        history: Vec<ForecastPoint>,
        future: Vec<ForecastPoint>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            history,
            future,
        }
    }

    pub fn history(&self) -> &[ForecastPoint] {
        &self.history
    }

    pub fn future(&self) -> &[ForecastPoint] {
        &self.future
    }

    /// History tail then future, in timestamp order.
    pub fn points(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.history.iter().chain(self.future.iter())
    }

    pub fn horizon_days(&self) -> usize {
        self.future.len()
    }
}
