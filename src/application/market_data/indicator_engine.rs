//! Technical indicators over a candle series.
//!
//! Wraps the `ta` crate's streaming indicators and masks every value produced
//! before the indicator's window is full, so warm-up output is `None` rather
//! than a seeded or partial number.

use crate::domain::errors::PipelineError;
use crate::domain::indicators::{IndicatorPoint, IndicatorSet};
use crate::domain::market::CandleSeries;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{
    BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex, SimpleMovingAverage,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: 10,
            ema_period: 10,
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
        }
    }
}

impl IndicatorConfig {
    /// Index of the first defined MACD signal/histogram value.
    fn macd_signal_start(&self) -> usize {
        self.macd_slow_period + self.macd_signal_period - 2
    }
}

/// Pure indicator computation; holds freshly-constructed indicator prototypes
/// that are cloned for every series so no state leaks between calls.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    sma: SimpleMovingAverage,
    ema: ExponentialMovingAverage,
    rsi: RelativeStrengthIndex,
    macd: MovingAverageConvergenceDivergence,
    bollinger: BollingerBands,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, PipelineError> {
        if config.macd_fast_period >= config.macd_slow_period {
            return Err(PipelineError::invalid_request(format!(
                "MACD fast period {} must be shorter than slow period {}",
                config.macd_fast_period, config.macd_slow_period
            )));
        }

        let invalid = |name: &str, e: ta::errors::TaError| {
            PipelineError::invalid_request(format!("invalid {} parameters: {:?}", name, e))
        };

        Ok(Self {
            config,
            sma: SimpleMovingAverage::new(config.sma_period).map_err(|e| invalid("SMA", e))?,
            ema: ExponentialMovingAverage::new(config.ema_period).map_err(|e| invalid("EMA", e))?,
            rsi: RelativeStrengthIndex::new(config.rsi_period).map_err(|e| invalid("RSI", e))?,
            macd: MovingAverageConvergenceDivergence::new(
                config.macd_fast_period,
                config.macd_slow_period,
                config.macd_signal_period,
            )
            .map_err(|e| invalid("MACD", e))?,
            bollinger: BollingerBands::new(config.bollinger_period, config.bollinger_std_dev)
                .map_err(|e| invalid("Bollinger", e))?,
        })
    }

    /// Computes one indicator point per candle.
    pub fn compute(&self, series: &CandleSeries) -> IndicatorSet {
        let mut sma = self.sma.clone();
        let mut ema = self.ema.clone();
        let mut rsi = self.rsi.clone();
        let mut macd = self.macd.clone();
        let mut bollinger = self.bollinger.clone();

        let cfg = &self.config;
        let defined = |ready: bool, value: f64| (ready && value.is_finite()).then_some(value);

        let points = series
            .candles()
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let price = candle.close;

                let sma_val = sma.next(price);
                let ema_val = ema.next(price);
                let rsi_val = rsi.next(price);
                let macd_val = macd.next(price);
                let bb_val = bollinger.next(price);

                let macd_ready = i + 1 >= cfg.macd_slow_period;
                let signal_ready = i >= cfg.macd_signal_start();
                let bb_ready = i + 1 >= cfg.bollinger_period;

                IndicatorPoint {
                    timestamp: candle.timestamp,
                    sma: defined(i + 1 >= cfg.sma_period, sma_val),
                    ema: defined(i + 1 >= cfg.ema_period, ema_val),
                    // RSI needs `period` price changes, i.e. period + 1 closes
                    rsi: defined(i >= cfg.rsi_period, rsi_val),
                    macd: defined(macd_ready, macd_val.macd),
                    macd_signal: defined(signal_ready, macd_val.signal),
                    macd_histogram: defined(signal_ready, macd_val.histogram),
                    bollinger_middle: defined(bb_ready, bb_val.average),
                    bollinger_upper: defined(bb_ready, bb_val.upper),
                    bollinger_lower: defined(bb_ready, bb_val.lower),
                }
            })
            .collect();

        IndicatorSet {
            symbol: series.symbol().to_string(),
            points,
        }
    }
}
