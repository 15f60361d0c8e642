//! Quote source configuration parsed from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where candles and prices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketDataSource {
    Binance,
    /// Deterministic synthetic candles, no network.
    Mock,
}

impl FromStr for MarketDataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(MarketDataSource::Binance),
            "mock" => Ok(MarketDataSource::Mock),
            _ => anyhow::bail!(
                "Invalid MARKET_DATA_SOURCE: {}. Must be 'binance' or 'mock'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketDataEnvConfig {
    pub source: MarketDataSource,
    pub binance_base_url: String,
    pub timeout: Duration,
}

impl Default for MarketDataEnvConfig {
    fn default() -> Self {
        Self {
            source: MarketDataSource::Binance,
            binance_base_url: "https://api.binance.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl MarketDataEnvConfig {
    pub fn from_env() -> Result<Self> {
        let source = env::var("MARKET_DATA_SOURCE").unwrap_or_else(|_| "binance".to_string());
        let timeout_secs = env::var("MARKET_DATA_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .context("Failed to parse MARKET_DATA_TIMEOUT_SECS")?;
        if timeout_secs == 0 {
            anyhow::bail!("MARKET_DATA_TIMEOUT_SECS must be greater than 0");
        }

        Ok(Self {
            source: MarketDataSource::from_str(&source)?,
            binance_base_url: env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_source_parsing() {
        assert_eq!(
            MarketDataSource::from_str("Binance").unwrap(),
            MarketDataSource::Binance
        );
        assert_eq!(
            MarketDataSource::from_str(" mock ").unwrap(),
            MarketDataSource::Mock
        );
        assert!(MarketDataSource::from_str("alpaca").is_err());
    }
}
