use super::interval::Interval;
use crate::domain::validation::data_quality::StrictCandleValidator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Candle #{index} is invalid: {reason}")]
    InvalidCandle { index: usize, reason: String },

    #[error("Candle #{index} at {timestamp} is not after its predecessor")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Time-ordered candles for one symbol/interval pair.
///
/// Timestamps are strictly increasing and every candle satisfies
/// `low <= open, close <= high`; both are checked on construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandleSeries {
    symbol: String,
    interval: Interval,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        candles: Vec<Candle>,
    ) -> Result<Self, SeriesError> {
        for (index, candle) in candles.iter().enumerate() {
            if let Err(reason) = StrictCandleValidator::check(candle) {
                return Err(SeriesError::InvalidCandle { index, reason });
            }
        }

        if let Some(index) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SeriesError::OutOfOrder {
                index: index + 1,
                timestamp: candles[index + 1].timestamp,
            });
        }

        Ok(Self {
            symbol: symbol.into(),
            interval,
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}
