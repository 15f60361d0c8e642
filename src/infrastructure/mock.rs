use crate::domain::errors::PipelineError;
use crate::domain::market::{Candle, CandleSeries, Interval};
use crate::domain::ports::MarketDataClient;
use async_trait::async_trait;
use chrono::{DateTime, DurationRound, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Deterministic synthetic candles: a gentle uptrend with a sine overlay,
/// `limit` bars ending at (and including) `end`.
pub fn synthetic_series(
    symbol: &str,
    interval: Interval,
    limit: usize,
    end: DateTime<Utc>,
) -> Result<CandleSeries, PipelineError> {
    // Per-symbol base price so different symbols do not look identical.
    let base = 100.0 + symbol.bytes().map(f64::from).sum::<f64>();
    let step = interval.duration();

    let candles = (0..limit)
        .map(|i| {
            let offset = (limit - 1 - i) as i32;
            let x = i as f64;
            let close = base * (1.0 + 0.001 * x) + (x / 5.0).sin() * base * 0.01;
            let open = close - (x / 3.0).cos() * base * 0.002;
            Candle {
                timestamp: end - step * offset,
                open,
                high: open.max(close) * 1.001,
                low: open.min(close) * 0.999,
                close,
                volume: 10.0 + (i % 7) as f64,
            }
        })
        .collect();

    CandleSeries::new(symbol, interval, candles)
        .map_err(|e| PipelineError::bad_response("Mock", e.to_string()))
}

#[derive(Default)]
struct MockState {
    scripted: HashMap<String, VecDeque<Result<CandleSeries, PipelineError>>>,
    failures: HashMap<String, PipelineError>,
    series_calls: HashMap<String, usize>,
}

/// In-memory [`MarketDataClient`].
///
/// Lookup order per call: one-shot scripted results, then a sticky failure,
/// then a synthetic series ending at `end`.
#[derive(Clone)]
pub struct MockMarketDataClient {
    state: Arc<RwLock<MockState>>,
    end: Option<DateTime<Utc>>,
}

impl MockMarketDataClient {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            end: None,
        }
    }

    /// Pins the last candle's open time instead of using the current time.
    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub async fn push_result(&self, symbol: &str, result: Result<CandleSeries, PipelineError>) {
        let mut state = self.state.write().await;
        state
            .scripted
            .entry(symbol.to_uppercase())
            .or_default()
            .push_back(result);
    }

    /// Every call for `symbol` fails with `error` until cleared.
    pub async fn fail_symbol(&self, symbol: &str, error: PipelineError) {
        let mut state = self.state.write().await;
        state.failures.insert(symbol.to_uppercase(), error);
    }

    pub async fn clear_failure(&self, symbol: &str) {
        let mut state = self.state.write().await;
        state.failures.remove(&symbol.to_uppercase());
    }

    pub async fn series_calls(&self, symbol: &str) -> usize {
        let state = self.state.read().await;
        state
            .series_calls
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(0)
    }

    fn end_for(&self, interval: Interval) -> DateTime<Utc> {
        self.end.unwrap_or_else(|| {
            let now = Utc::now();
            now.duration_trunc(interval.duration()).unwrap_or(now)
        })
    }
}

impl Default for MockMarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataClient for MockMarketDataClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, PipelineError> {
        let key = symbol.trim().to_uppercase();
        if key.is_empty() {
            return Err(PipelineError::bad_response("Mock", "symbol must not be empty"));
        }

        let mut state = self.state.write().await;
        *state.series_calls.entry(key.clone()).or_insert(0) += 1;

        if let Some(result) = state.scripted.get_mut(&key).and_then(|q| q.pop_front()) {
            debug!("MockMarketDataClient: scripted result for {}", key);
            return result;
        }
        if let Some(error) = state.failures.get(&key) {
            return Err(error.clone());
        }
        drop(state);

        synthetic_series(&key, interval, limit, self.end_for(interval))
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, PipelineError> {
        let key = symbol.trim().to_uppercase();
        if let Some(error) = self.state.read().await.failures.get(&key) {
            return Err(error.clone());
        }

        let series = synthetic_series(&key, Interval::OneMin, 1, self.end_for(Interval::OneMin))?;
        series
            .last()
            .map(|c| c.close)
            .ok_or_else(|| PipelineError::bad_response("Mock", "empty synthetic series"))
    }
}
