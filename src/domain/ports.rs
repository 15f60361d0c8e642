use crate::domain::errors::PipelineError;
use crate::domain::forecast::Forecast;
use crate::domain::market::{CandleSeries, Interval};
use crate::domain::news::NewsItem;
use crate::domain::sentiment::SentimentLabel;
use async_trait::async_trait;

// Need async_trait for async functions in traits
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches the most recent `limit` candles for `symbol`.
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, PipelineError>;

    /// Fetches the instantaneous price for `symbol`.
    async fn fetch_price(&self, symbol: &str) -> Result<f64, PipelineError>;
}

#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// Fresh snapshot of recent headlines; an empty upstream list is not an error.
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>, PipelineError>;

    fn name(&self) -> &str;
}

pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentLabel;
}

/// Time-series model fitted to close prices.
///
/// Implementations must produce exactly `horizon_days` future points, one per
/// calendar day, whose interval half-width never shrinks as the horizon grows.
pub trait ForecastEngine: Send + Sync + 'static {
    type Model: Send + 'static;

    fn fit(&self, series: &CandleSeries) -> Result<Self::Model, PipelineError>;

    fn predict(&self, model: &Self::Model, horizon_days: u32) -> Result<Forecast, PipelineError>;

    fn name(&self) -> &str;
}
