use super::report::{
    CycleReport, NewsOutcome, PipelineStage, ScoredHeadline, SymbolFailure, SymbolOutcome,
    SymbolReport,
};
use crate::application::market_data::IndicatorEngine;
use crate::domain::errors::PipelineError;
use crate::domain::forecast::Forecast;
use crate::domain::market::{CandleSeries, Interval};
use crate::domain::news::NewsRotation;
use crate::domain::ports::{ForecastEngine, MarketDataClient, NewsFeed, SentimentScorer};
use crate::domain::refresh::{LoopState, RefreshConfig, RefreshState};
use anyhow::Context;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const REPORT_CHANNEL_CAPACITY: usize = 16;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Cloneable cancellation switch shared by the loop and its handle.
#[derive(Clone)]
pub struct RefreshCanceller {
    tx: Arc<watch::Sender<bool>>,
}

impl RefreshCanceller {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn cancel(&self) {
        // send_replace stores the value even when no receiver is listening.
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Resolves once cancellation has been requested.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|flag| *flag).await;
}

/// Drives fetch, indicators, forecast and news scoring over a symbol set.
pub struct RefreshLoop<F: ForecastEngine> {
    market_data: Arc<dyn MarketDataClient>,
    news_feed: Option<Arc<dyn NewsFeed>>,
    scorer: Arc<dyn SentimentScorer>,
    indicator_engine: IndicatorEngine,
    forecaster: Arc<F>,
    config: RefreshConfig,
    retry_backoff: Duration,
    canceller: RefreshCanceller,
    cancel_rx: watch::Receiver<bool>,
}

impl<F: ForecastEngine> RefreshLoop<F> {
    pub fn new(
        market_data: Arc<dyn MarketDataClient>,
        indicator_engine: IndicatorEngine,
        forecaster: F,
        scorer: Arc<dyn SentimentScorer>,
        config: RefreshConfig,
    ) -> Self {
        let (canceller, cancel_rx) = RefreshCanceller::new();
        Self {
            market_data,
            news_feed: None,
            scorer,
            indicator_engine,
            forecaster: Arc::new(forecaster),
            config,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            canceller,
            cancel_rx,
        }
    }

    pub fn with_news_feed(mut self, feed: Arc<dyn NewsFeed>) -> Self {
        self.news_feed = Some(feed);
        self
    }

    /// Base delay between retried fetches; attempt `n` waits `n * backoff`.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn canceller(&self) -> RefreshCanceller {
        self.canceller.clone()
    }

    /// Idle state for this loop's configuration, for callers driving `run_cycle` themselves.
    pub fn initial_state(&self) -> RefreshState {
        RefreshState::new(&self.config)
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Validates the configuration and spawns the loop on the runtime.
    pub fn start(self) -> Result<RefreshHandle, PipelineError> {
        self.config.validate()?;

        let (report_tx, report_rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
        let canceller = self.canceller.clone();
        let task = tokio::spawn(self.run(report_tx));

        Ok(RefreshHandle {
            canceller,
            reports: report_rx,
            task,
        })
    }

    async fn run(self, report_tx: mpsc::Sender<CycleReport>) -> RefreshState {
        let mut state = self.initial_state();
        let mut cancel_rx = self.cancel_rx.clone();
        state.loop_state = LoopState::Running;

        info!(
            "RefreshLoop: Started for {:?} ({}, horizon {}d, auto_repeat={})",
            state.symbols, state.interval, state.horizon_days, self.config.auto_repeat
        );

        loop {
            if self.is_cancelled() {
                info!("RefreshLoop: Cancellation requested, stopping");
                break;
            }

            let report = self.run_cycle(&mut state).await;
            let interrupted = report.interrupted;

            let delivered = tokio::select! {
                biased;
                sent = report_tx.send(report) => sent.is_ok(),
                _ = cancelled(&mut cancel_rx) => false,
            };
            if !delivered {
                info!("RefreshLoop: Report receiver gone or loop cancelled, stopping");
                break;
            }

            if interrupted || !self.config.auto_repeat {
                break;
            }

            debug!("RefreshLoop: Sleeping {:?} before next cycle", self.config.delay);
            tokio::select! {
                _ = tokio::time::sleep(self.config.delay) => {}
                _ = cancelled(&mut cancel_rx) => {
                    info!("RefreshLoop: Cancelled while waiting for next cycle");
                    break;
                }
                _ = report_tx.closed() => {
                    info!("RefreshLoop: Report receiver dropped, stopping");
                    break;
                }
            }
        }

        state.loop_state = LoopState::Cancelled;
        info!(
            "RefreshLoop: Stopped after {} completed cycle(s)",
            state.cycles_completed
        );
        state
    }

    /// One pass over every symbol followed by one news rotation step.
    ///
    /// A failing symbol is recorded and the pass moves on. Cancellation is
    /// honored between symbols.
    pub async fn run_cycle(&self, state: &mut RefreshState) -> CycleReport {
        let started_at = Utc::now();
        let cycle = state.cycles_completed + 1;
        let symbols = state.symbols.clone();
        let mut outcomes = Vec::with_capacity(symbols.len());
        let mut interrupted = false;

        debug!("RefreshLoop: Cycle #{} over {} symbol(s)", cycle, symbols.len());

        for symbol in &symbols {
            if self.is_cancelled() {
                interrupted = true;
                break;
            }
            let outcome = self
                .process_symbol(symbol, state.interval, state.horizon_days)
                .await;
            if let SymbolOutcome::Failed(failure) = &outcome {
                warn!(
                    "RefreshLoop: {} failed at {} after {} attempt(s): {}",
                    failure.symbol, failure.stage, failure.attempts, failure.error
                );
            }
            outcomes.push(outcome);
        }

        let news = if interrupted {
            NewsOutcome::Skipped
        } else {
            self.rotate_news(state).await
        };

        if !interrupted {
            state.cycles_completed += 1;
        }

        let report = CycleReport {
            cycle,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            news,
            interrupted,
        };

        info!(
            "RefreshLoop: Cycle #{} done: {} ok, {} failed{}",
            cycle,
            report.successes().count(),
            report.failures().count(),
            if interrupted { " (interrupted)" } else { "" }
        );

        report
    }

    async fn process_symbol(
        &self,
        symbol: &str,
        interval: Interval,
        horizon_days: u32,
    ) -> SymbolOutcome {
        let failed = |stage: PipelineStage, (error, attempts): (PipelineError, u32)| {
            SymbolOutcome::Failed(SymbolFailure {
                symbol: symbol.to_string(),
                stage,
                error,
                attempts,
            })
        };

        let series = match self
            .with_retry(symbol, PipelineStage::FetchSeries.to_string(), || {
                self.market_data
                    .fetch_series(symbol, interval, self.config.candle_limit)
            })
            .await
        {
            Ok(series) => series,
            Err(e) => return failed(PipelineStage::FetchSeries, e),
        };

        let indicators = self.indicator_engine.compute(&series);

        let forecast = match self.forecast(series.clone(), horizon_days).await {
            Ok(forecast) => forecast,
            Err(e) => return failed(PipelineStage::Forecast, (e, 1)),
        };

        let price = match self
            .with_retry(symbol, PipelineStage::FetchPrice.to_string(), || {
                self.market_data.fetch_price(symbol)
            })
            .await
        {
            Ok(price) => price,
            Err(e) => return failed(PipelineStage::FetchPrice, e),
        };

        debug!(
            "RefreshLoop: {} price={} candles={} forecast_points={}",
            symbol,
            price,
            series.len(),
            forecast.horizon_days()
        );

        SymbolOutcome::Completed(Box::new(SymbolReport {
            symbol: symbol.to_string(),
            series,
            indicators,
            forecast,
            price,
        }))
    }

    /// Fit and predict on the blocking pool so the runtime keeps serving I/O.
    async fn forecast(
        &self,
        series: CandleSeries,
        horizon_days: u32,
    ) -> Result<Forecast, PipelineError> {
        let engine = Arc::clone(&self.forecaster);
        tokio::task::spawn_blocking(move || {
            let model = engine.fit(&series)?;
            engine.predict(&model, horizon_days)
        })
        .await
        .map_err(|e| PipelineError::model(format!("forecast task failed: {}", e)))?
    }

    async fn rotate_news(&self, state: &mut RefreshState) -> NewsOutcome {
        let Some(feed) = &self.news_feed else {
            return NewsOutcome::Disabled;
        };

        let items = match self
            .with_retry(feed.name(), "fetch_latest".to_string(), || feed.fetch_latest())
            .await
        {
            Ok(items) => items,
            Err((error, _)) => {
                warn!("RefreshLoop: News feed {} failed: {}", feed.name(), error);
                return NewsOutcome::Failed(error);
            }
        };

        match NewsRotation::select(&items, state.news_index) {
            Some((item, next)) => {
                let sentiment = self.scorer.score(&item.title);
                state.news_index = next;
                state.last_rotation = Some(Utc::now());
                info!(
                    "RefreshLoop: Headline [{}] {} ({})",
                    sentiment, item.title, item.source
                );
                NewsOutcome::Headline(ScoredHeadline {
                    item: item.clone(),
                    sentiment,
                })
            }
            None => {
                debug!("RefreshLoop: News feed {} returned no items", feed.name());
                NewsOutcome::Empty
            }
        }
    }

    /// Runs `op` up to `fetch_attempts` times, retrying only transport failures.
    /// On failure returns the last error with the number of attempts made.
    async fn with_retry<T, Fut>(
        &self,
        subject: &str,
        action: String,
        mut op: impl FnMut() -> Fut,
    ) -> Result<T, (PipelineError, u32)>
    where
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let max_attempts = self.config.fetch_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts && !self.is_cancelled() => {
                    warn!(
                        "RefreshLoop: {} {} attempt {}/{} failed: {}. Retrying...",
                        subject, action, attempt, max_attempts, e
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err((e, attempt)),
            }
        }
    }
}

/// Caller's side of a started loop.
pub struct RefreshHandle {
    canceller: RefreshCanceller,
    reports: mpsc::Receiver<CycleReport>,
    task: JoinHandle<RefreshState>,
}

impl RefreshHandle {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> RefreshCanceller {
        self.canceller.clone()
    }

    /// Next cycle report, or `None` once the loop has stopped and the channel is drained.
    pub async fn next_report(&mut self) -> Option<CycleReport> {
        self.reports.recv().await
    }

    /// Waits for the loop to stop and returns its final state.
    ///
    /// Undelivered reports are discarded; a loop blocked on delivery stops.
    pub async fn join(self) -> anyhow::Result<RefreshState> {
        let RefreshHandle { reports, task, .. } = self;
        drop(reports);
        task.await.context("refresh loop task failed")
    }
}
