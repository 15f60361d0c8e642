//! Refresh loop configuration parsed from environment variables.

use crate::domain::market::Interval;
use crate::domain::refresh::RefreshConfig;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RefreshEnvConfig {
    pub symbols: Vec<String>,
    pub interval: Interval,
    pub horizon_days: u32,
    pub auto_repeat: bool,
    pub refresh_delay_secs: u64,
    pub candle_limit: usize,
    pub fetch_attempts: u32,
}

impl RefreshEnvConfig {
    pub fn from_env() -> Result<Self> {
        let symbols_str = env::var("SYMBOLS").unwrap_or_else(|_| "BTCUSDT".to_string());
        let interval_str = env::var("INTERVAL").unwrap_or_else(|_| "1m".to_string());

        Ok(Self {
            symbols: parse_symbol_list(&symbols_str),
            interval: Interval::from_str(&interval_str).context("Failed to parse INTERVAL")?,
            horizon_days: Self::parse_u32("HORIZON_DAYS", 7)?,
            auto_repeat: Self::parse_bool("AUTO_REPEAT", true),
            refresh_delay_secs: Self::parse_u64("REFRESH_DELAY_SECS", 60)?,
            candle_limit: Self::parse_usize("CANDLE_LIMIT", 100)?,
            fetch_attempts: Self::parse_u32("FETCH_ATTEMPTS", 1)?,
        })
    }

    pub fn to_refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            symbols: self.symbols.clone(),
            interval: self.interval,
            horizon_days: self.horizon_days,
            auto_repeat: self.auto_repeat,
            delay: Duration::from_secs(self.refresh_delay_secs),
            candle_limit: self.candle_limit,
            fetch_attempts: self.fetch_attempts,
        }
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u32(key: &str, default: u32) -> Result<u32> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u32>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u64(key: &str, default: u64) -> Result<u64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<bool>()
            .unwrap_or(default)
    }
}

/// Splits a comma-separated symbol list, dropping blanks.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
