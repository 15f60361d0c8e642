use crate::domain::errors::PipelineError;
use crate::domain::market::Interval;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upper bound on candles per request accepted by the quote source.
pub const MAX_CANDLE_LIMIT: usize = 1000;

/// Longest forecast horizon a loop or engine accepts.
pub const MAX_HORIZON_DAYS: u32 = 365;

/// Lifecycle of a refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    Idle,
    Running,
    Cancelled,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Configuration snapshot a refresh loop is started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub symbols: Vec<String>,
    pub interval: Interval,
    pub horizon_days: u32,
    pub auto_repeat: bool,
    pub delay: Duration,
    pub candle_limit: usize,
    /// Attempts per fetch; transport failures are retried up to this count.
    pub fetch_attempts: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
            interval: Interval::OneMin,
            horizon_days: 7,
            auto_repeat: true,
            delay: Duration::from_secs(60),
            candle_limit: 100,
            fetch_attempts: 1,
        }
    }
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.symbols.is_empty() {
            return Err(PipelineError::invalid_request("symbol set is empty"));
        }
        if let Some(blank) = self.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(PipelineError::invalid_request(format!(
                "blank symbol in set: {:?}",
                blank
            )));
        }
        if self.horizon_days == 0 || self.horizon_days > MAX_HORIZON_DAYS {
            return Err(PipelineError::invalid_request(format!(
                "horizon_days must be within 1..={}, got {}",
                MAX_HORIZON_DAYS, self.horizon_days
            )));
        }
        if self.candle_limit == 0 || self.candle_limit > MAX_CANDLE_LIMIT {
            return Err(PipelineError::invalid_request(format!(
                "candle_limit must be within 1..={}, got {}",
                MAX_CANDLE_LIMIT, self.candle_limit
            )));
        }
        if self.fetch_attempts == 0 {
            return Err(PipelineError::invalid_request("fetch_attempts must be > 0"));
        }
        Ok(())
    }

    /// Symbols in configured order with duplicates removed.
    pub fn unique_symbols(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }
}

/// Mutable state owned by a running refresh loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshState {
    pub symbols: Vec<String>,
    pub interval: Interval,
    pub horizon_days: u32,
    pub news_index: usize,
    pub last_rotation: Option<DateTime<Utc>>,
    pub cycles_completed: u64,
    pub loop_state: LoopState,
}

impl RefreshState {
    pub fn new(config: &RefreshConfig) -> Self {
        Self {
            symbols: config.unique_symbols(),
            interval: config.interval,
            horizon_days: config.horizon_days,
            news_index: 0,
            last_rotation: None,
            cycles_completed: 0,
            loop_state: LoopState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RefreshConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RefreshConfig::default();
        config.symbols.clear();
        assert!(config.validate().is_err());

        let config = RefreshConfig {
            horizon_days: 0,
            ..RefreshConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RefreshConfig {
            horizon_days: 50_000_000,
            ..RefreshConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidRequest { .. })
        ));

        let config = RefreshConfig {
            horizon_days: MAX_HORIZON_DAYS,
            ..RefreshConfig::default()
        };
        assert!(config.validate().is_ok());

        let config = RefreshConfig {
            candle_limit: MAX_CANDLE_LIMIT + 1,
            ..RefreshConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RefreshConfig {
            symbols: vec!["BTCUSDT".to_string(), "  ".to_string()],
            ..RefreshConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_state_starts_idle_with_deduplicated_symbols() {
        let config = RefreshConfig {
            symbols: vec!["btcusdt".into(), "ETHUSDT".into(), "BTCUSDT".into()],
            ..RefreshConfig::default()
        };
        let state = RefreshState::new(&config);

        assert_eq!(state.loop_state, LoopState::Idle);
        assert_eq!(state.symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(state.news_index, 0);
        assert!(state.last_rotation.is_none());
    }
}
