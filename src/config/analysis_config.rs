//! Indicator, forecast and sentiment parameters parsed from environment variables.

use crate::application::market_data::IndicatorConfig;
use crate::application::ml::{ForecastConfig, RandomForestConfig, SeasonalityMode};
use crate::domain::sentiment::{
    DEFAULT_NEGATIVE_THRESHOLD, DEFAULT_POSITIVE_THRESHOLD, SentimentThresholds,
};
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Forecast engine driving the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastModel {
    #[default]
    TrendSeasonality,
    RandomForest,
}

impl FromStr for ForecastModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trend" | "trend_seasonality" => Ok(ForecastModel::TrendSeasonality),
            "random_forest" | "rf" => Ok(ForecastModel::RandomForest),
            _ => anyhow::bail!(
                "Invalid FORECAST_MODEL: {}. Must be 'trend' or 'random_forest'",
                s
            ),
        }
    }
}

impl fmt::Display for ForecastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastModel::TrendSeasonality => write!(f, "trend"),
            ForecastModel::RandomForest => write!(f, "random_forest"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisEnvConfig {
    pub indicators: IndicatorConfig,
    pub forecast_model: ForecastModel,
    pub forecast: ForecastConfig,
    pub random_forest: RandomForestConfig,
    pub sentiment: SentimentThresholds,
}

impl AnalysisEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = IndicatorConfig::default();
        let indicators = IndicatorConfig {
            sma_period: Self::parse_usize("SMA_PERIOD", defaults.sma_period)?,
            ema_period: Self::parse_usize("EMA_PERIOD", defaults.ema_period)?,
            rsi_period: Self::parse_usize("RSI_PERIOD", defaults.rsi_period)?,
            macd_fast_period: Self::parse_usize("MACD_FAST_PERIOD", defaults.macd_fast_period)?,
            macd_slow_period: Self::parse_usize("MACD_SLOW_PERIOD", defaults.macd_slow_period)?,
            macd_signal_period: Self::parse_usize(
                "MACD_SIGNAL_PERIOD",
                defaults.macd_signal_period,
            )?,
            bollinger_period: Self::parse_usize("BOLLINGER_PERIOD", defaults.bollinger_period)?,
            bollinger_std_dev: Self::parse_f64("BOLLINGER_STD_DEV", defaults.bollinger_std_dev)?,
        };

        let forecast_defaults = ForecastConfig::default();
        let forecast = ForecastConfig {
            interval_width: Self::parse_f64(
                "FORECAST_INTERVAL_WIDTH",
                forecast_defaults.interval_width,
            )?,
            history_tail: Self::parse_usize(
                "FORECAST_HISTORY_TAIL",
                forecast_defaults.history_tail,
            )?,
            daily_seasonality: Self::parse_mode("FORECAST_DAILY_SEASONALITY")?,
            weekly_seasonality: Self::parse_mode("FORECAST_WEEKLY_SEASONALITY")?,
            ..forecast_defaults
        };

        let forecast_model = ForecastModel::from_str(
            &env::var("FORECAST_MODEL").unwrap_or_else(|_| "trend".to_string()),
        )?;

        let forest_defaults = RandomForestConfig::default();
        let random_forest = RandomForestConfig {
            n_trees: Self::parse_usize("FORECAST_RF_TREES", forest_defaults.n_trees)?,
            max_depth: env::var("FORECAST_RF_MAX_DEPTH")
                .unwrap_or_else(|_| forest_defaults.max_depth.to_string())
                .parse::<u16>()
                .context("Failed to parse FORECAST_RF_MAX_DEPTH")?,
            ..forest_defaults
        };

        let sentiment = SentimentThresholds::new(
            Self::parse_f64("SENTIMENT_POSITIVE_THRESHOLD", DEFAULT_POSITIVE_THRESHOLD)?,
            Self::parse_f64("SENTIMENT_NEGATIVE_THRESHOLD", DEFAULT_NEGATIVE_THRESHOLD)?,
        )
        .map_err(|e| anyhow::anyhow!("Invalid sentiment thresholds: {}", e))?;

        Ok(Self {
            indicators,
            forecast_model,
            forecast,
            random_forest,
            sentiment,
        })
    }

    fn parse_mode(key: &str) -> Result<SeasonalityMode> {
        let raw = env::var(key).unwrap_or_else(|_| "auto".to_string());
        SeasonalityMode::from_str(&raw).context(format!("Failed to parse {}", key))
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
