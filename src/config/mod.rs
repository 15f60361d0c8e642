//! Configuration module for candlecast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Market data, News, Refresh, Analysis, and Observability.

mod analysis_config;
mod market_data_config;
mod news_config;
mod observability_config;
mod refresh_env_config;

pub use analysis_config::{AnalysisEnvConfig, ForecastModel};
pub use market_data_config::{MarketDataEnvConfig, MarketDataSource};
pub use news_config::{DEFAULT_RSS_URL, NewsEnvConfig, NewsSource};
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use refresh_env_config::{RefreshEnvConfig, parse_symbol_list};

use crate::application::market_data::IndicatorConfig;
use crate::application::ml::{ForecastConfig, RandomForestConfig};
use crate::domain::refresh::RefreshConfig;
use crate::domain::sentiment::SentimentThresholds;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Main application configuration.
///
/// Aggregates every sub-config; the binary applies CLI overrides on top.
#[derive(Debug, Clone)]
pub struct Config {
    pub market_data: MarketDataEnvConfig,
    pub news: NewsEnvConfig,
    pub refresh: RefreshEnvConfig,
    pub analysis: AnalysisEnvConfig,
    pub observability: ObservabilityEnvConfig,
    /// Directory receiving `<SYMBOL>_forecast.csv` files; unset disables export.
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let market_data =
            MarketDataEnvConfig::from_env().context("Failed to load market data config")?;
        let news = NewsEnvConfig::from_env().context("Failed to load news config")?;
        let refresh = RefreshEnvConfig::from_env().context("Failed to load refresh config")?;
        let analysis = AnalysisEnvConfig::from_env().context("Failed to load analysis config")?;
        let observability =
            ObservabilityEnvConfig::from_env().context("Failed to load observability config")?;

        let export_dir = env::var("EXPORT_DIR")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            market_data,
            news,
            refresh,
            analysis,
            observability,
            export_dir,
        })
    }

    /// Create a RefreshConfig domain value object from this Config
    pub fn to_refresh_config(&self) -> Result<RefreshConfig> {
        let config = self.refresh.to_refresh_config();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid refresh config: {}", e))?;
        Ok(config)
    }

    pub fn indicator_config(&self) -> IndicatorConfig {
        self.analysis.indicators
    }

    pub fn forecast_config(&self) -> ForecastConfig {
        self.analysis.forecast
    }

    pub fn random_forest_config(&self) -> RandomForestConfig {
        self.analysis.random_forest
    }

    pub fn sentiment_thresholds(&self) -> SentimentThresholds {
        self.analysis.sentiment
    }
}
