use anyhow::{Context, Result};
use candlecast::application::export::export_forecast;
use candlecast::application::market_data::IndicatorEngine;
use candlecast::application::ml::{RandomForestForecaster, TrendSeasonalityForecaster};
use candlecast::application::refresh::{CycleReport, NewsOutcome, RefreshLoop};
use candlecast::config::{
    Config, ForecastModel, LogFormat, MarketDataSource, NewsSource, parse_symbol_list,
};
use candlecast::domain::market::Interval;
use candlecast::domain::ports::{ForecastEngine, MarketDataClient, NewsFeed, SentimentScorer};
use candlecast::domain::refresh::RefreshConfig;
use candlecast::infrastructure::binance::BinanceMarketDataClient;
use candlecast::infrastructure::mock::MockMarketDataClient;
use candlecast::infrastructure::news::{CryptoPanicNewsFeed, RssNewsFeed, VaderSentimentScorer};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless crypto candle refresh and forecast pipeline", long_about = None)]
struct Args {
    /// Comma-separated symbols, e.g. BTCUSDT,ETHUSDT (overrides SYMBOLS)
    #[arg(long)]
    symbols: Option<String>,

    /// Candle interval: 1m, 5m, 15m, 1h or 1d (overrides INTERVAL)
    #[arg(long)]
    interval: Option<String>,

    /// Forecast horizon in days (overrides HORIZON_DAYS)
    #[arg(long)]
    horizon: Option<u32>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Write <SYMBOL>_forecast.csv files here (overrides EXPORT_DIR)
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(symbols) = &self.symbols {
            config.refresh.symbols = parse_symbol_list(symbols);
        }
        if let Some(interval) = &self.interval {
            config.refresh.interval =
                Interval::from_str(interval).context("Invalid --interval")?;
        }
        if let Some(horizon) = self.horizon {
            config.refresh.horizon_days = horizon;
        }
        if self.once {
            config.refresh.auto_repeat = false;
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = Some(dir.clone());
        }
        Ok(())
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (pretty, compact) = match format {
        LogFormat::Pretty => (
            Some(tracing_subscriber::fmt::layer().with_target(false).pretty()),
            None,
        ),
        LogFormat::Compact => (
            None,
            Some(tracing_subscriber::fmt::layer().with_target(false).compact()),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(compact)
        .init();
}

fn log_report(report: &CycleReport) {
    for summary in report.successes() {
        let next = summary.forecast.future().first();
        info!(
            "{}: price {:.4} | {} candles | forecast day+1 {} [{}, {}]",
            summary.symbol,
            summary.price,
            summary.series.len(),
            next.map(|p| format!("{:.4}", p.predicted)).unwrap_or_default(),
            next.map(|p| format!("{:.4}", p.lower)).unwrap_or_default(),
            next.map(|p| format!("{:.4}", p.upper)).unwrap_or_default(),
        );
    }
    for failure in report.failures() {
        warn!(
            "{}: failed at {}: {}",
            failure.symbol, failure.stage, failure.error
        );
    }
    match &report.news {
        NewsOutcome::Headline(h) => info!("News: {} [{}]", h.item.title, h.sentiment),
        NewsOutcome::Failed(e) => warn!("News unavailable: {}", e),
        NewsOutcome::Empty => info!("News: no headlines available"),
        NewsOutcome::Disabled | NewsOutcome::Skipped => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load Env (before starting anything)
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.observability.log_format);
    args.apply(&mut config)?;

    let refresh_config = config.to_refresh_config()?;
    info!(
        "Starting candlecast: symbols={:?} interval={} horizon={}d auto_repeat={}",
        refresh_config.symbols,
        refresh_config.interval,
        refresh_config.horizon_days,
        refresh_config.auto_repeat
    );

    let market_data: Arc<dyn MarketDataClient> = match config.market_data.source {
        MarketDataSource::Binance => Arc::new(
            BinanceMarketDataClient::builder()
                .base_url(config.market_data.binance_base_url.clone())
                .timeout(config.market_data.timeout)
                .build()
                .context("Failed to build market data client")?,
        ),
        MarketDataSource::Mock => {
            warn!("Using synthetic market data (MARKET_DATA_SOURCE=mock)");
            Arc::new(MockMarketDataClient::new())
        }
    };

    let news_feed: Option<Arc<dyn NewsFeed>> = match config.news.source {
        NewsSource::CryptoPanic => Some(Arc::new(
            CryptoPanicNewsFeed::new(
                config.news.url.clone(),
                config.news.api_token.clone(),
                config.market_data.timeout,
            )
            .context("Failed to build news client")?,
        )),
        NewsSource::Rss => Some(Arc::new(
            RssNewsFeed::new(config.news.url.clone(), config.market_data.timeout)
                .context("Failed to build news client")?,
        )),
        NewsSource::None => None,
    };

    let scorer = Arc::new(VaderSentimentScorer::new(config.sentiment_thresholds()));

    match config.analysis.forecast_model {
        ForecastModel::TrendSeasonality => {
            let forecaster = TrendSeasonalityForecaster::new(config.forecast_config())?;
            run(&config, refresh_config, market_data, news_feed, forecaster, scorer).await
        }
        ForecastModel::RandomForest => {
            let forecaster = RandomForestForecaster::new(
                config.forecast_config(),
                config.random_forest_config(),
            )?;
            run(&config, refresh_config, market_data, news_feed, forecaster, scorer).await
        }
    }
}

async fn run<F: ForecastEngine>(
    config: &Config,
    refresh_config: RefreshConfig,
    market_data: Arc<dyn MarketDataClient>,
    news_feed: Option<Arc<dyn NewsFeed>>,
    forecaster: F,
    scorer: Arc<dyn SentimentScorer>,
) -> Result<()> {
    info!("Forecast model: {}", forecaster.name());
    let indicator_engine = IndicatorEngine::new(config.indicator_config())?;

    let mut refresh = RefreshLoop::new(
        market_data,
        indicator_engine,
        forecaster,
        scorer,
        refresh_config,
    );
    if let Some(feed) = news_feed {
        refresh = refresh.with_news_feed(feed);
    }

    let mut handle = refresh.start()?;

    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received. Cancelling refresh loop...");
            canceller.cancel();
        }
    });

    while let Some(report) = handle.next_report().await {
        log_report(&report);

        if let Some(dir) = &config.export_dir {
            for summary in report.successes() {
                if let Err(e) = export_forecast(&summary.forecast, dir) {
                    warn!("Forecast export for {} failed: {:#}", summary.symbol, e);
                }
            }
        }
    }

    let state = handle.join().await?;
    info!(
        "Refresh loop {} after {} cycle(s). Exiting...",
        state.loop_state, state.cycles_completed
    );

    Ok(())
}
