//! Random forest forecaster.
//!
//! Each candle's open, high, low, close, volume, weekday, hour and minute are
//! regressed onto the next candle's close. Future days reuse the last candle's
//! prices with the calendar features of the target timestamp. The band treats
//! close-to-close changes as a random walk: half-width at day `k` is
//! `z * σ_step * sqrt(k * candles_per_day)`.

use super::horizon::{DEFAULT_Z, MIN_OBSERVATIONS, future_timestamps, interval_z};
use super::trend_forecaster::ForecastConfig;
use crate::domain::errors::PipelineError;
use crate::domain::forecast::{Forecast, ForecastPoint};
use crate::domain::market::{Candle, CandleSeries};
use crate::domain::ports::ForecastEngine;
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Model fitted by [`RandomForestForecaster::fit`].
#[derive(Debug)]
pub struct RandomForestModel {
    symbol: String,
    last: Candle,
    candles_per_day: f64,
    forest: Forest,
    step_std: f64,
    fitted: Vec<(DateTime<Utc>, f64)>,
}

impl RandomForestModel {
    /// Candles the model was fitted on.
    pub fn observations(&self) -> usize {
        self.fitted.len() + 1
    }

    /// Standard deviation of one-candle close changes.
    pub fn step_std(&self) -> f64 {
        self.step_std
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.last.timestamp
    }
}

fn features(candle: &Candle, at: DateTime<Utc>) -> Vec<f64> {
    vec![
        candle.open,
        candle.high,
        candle.low,
        candle.close,
        candle.volume,
        f64::from(at.weekday().num_days_from_monday()),
        f64::from(at.hour()),
        f64::from(at.minute()),
    ]
}

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, PipelineError> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| PipelineError::model(format!("Matrix creation failed: {}", e)))
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub struct RandomForestForecaster {
    config: ForecastConfig,
    forest: RandomForestConfig,
    z: f64,
}

impl RandomForestForecaster {
    pub fn new(config: ForecastConfig, forest: RandomForestConfig) -> Result<Self, PipelineError> {
        if forest.n_trees == 0 {
            return Err(PipelineError::invalid_request("n_trees must be > 0"));
        }
        let z = interval_z(config.interval_width)?;
        Ok(Self { config, forest, z })
    }
}

impl Default for RandomForestForecaster {
    fn default() -> Self {
        Self {
            config: ForecastConfig::default(),
            forest: RandomForestConfig::default(),
            z: DEFAULT_Z,
        }
    }
}

impl ForecastEngine for RandomForestForecaster {
    type Model = RandomForestModel;

    fn fit(&self, series: &CandleSeries) -> Result<RandomForestModel, PipelineError> {
        if series.len() < MIN_OBSERVATIONS {
            return Err(PipelineError::InsufficientData {
                symbol: series.symbol().to_string(),
                required: MIN_OBSERVATIONS,
                available: series.len(),
            });
        }

        let candles = series.candles();
        let rows: Vec<Vec<f64>> = candles[..candles.len() - 1]
            .iter()
            .map(|c| features(c, c.timestamp))
            .collect();
        let y: Vec<f64> = candles[1..].iter().map(|c| c.close).collect();

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.forest.n_trees)
            .with_max_depth(self.forest.max_depth)
            .with_min_samples_split(self.forest.min_samples_split)
            .with_seed(self.forest.seed);
        let x = to_matrix(&rows)?;
        let forest = RandomForestRegressor::fit(&x, &y, params)
            .map_err(|e| PipelineError::model(format!("Training error: {}", e)))?;

        let in_sample = forest
            .predict(&x)
            .map_err(|e| PipelineError::model(format!("Prediction failed: {}", e)))?;
        if in_sample.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::model(format!(
                "{}: forest produced non-finite values",
                series.symbol()
            )));
        }

        let changes: Vec<f64> = candles.windows(2).map(|w| w[1].close - w[0].close).collect();
        let step_std = std_dev(&changes);

        let fitted = candles[1..]
            .iter()
            .zip(&in_sample)
            .map(|(c, v)| (c.timestamp, *v))
            .collect();

        debug!(
            "RandomForestForecaster: {} fitted on {} rows ({} trees), σ_step={:.6}",
            series.symbol(),
            rows.len(),
            self.forest.n_trees,
            step_std
        );

        Ok(RandomForestModel {
            symbol: series.symbol().to_string(),
            last: candles[candles.len() - 1],
            candles_per_day: MINUTES_PER_DAY / series.interval().to_minutes() as f64,
            forest,
            step_std,
            fitted,
        })
    }

    fn predict(
        &self,
        model: &RandomForestModel,
        horizon_days: u32,
    ) -> Result<Forecast, PipelineError> {
        let future_timestamps = future_timestamps(model.last.timestamp, horizon_days)?;

        let rows: Vec<Vec<f64>> = future_timestamps
            .iter()
            .map(|ts| features(&model.last, *ts))
            .collect();
        let predictions = model
            .forest
            .predict(&to_matrix(&rows)?)
            .map_err(|e| PipelineError::model(format!("Prediction failed: {}", e)))?;

        let base_width = self.z * model.step_std;

        let future = future_timestamps
            .into_iter()
            .zip(predictions)
            .enumerate()
            .map(|(i, (timestamp, predicted))| {
                let half_width = base_width * ((i + 1) as f64 * model.candles_per_day).sqrt();
                ForecastPoint {
                    timestamp,
                    predicted,
                    lower: predicted - half_width,
                    upper: predicted + half_width,
                }
            })
            .collect::<Vec<_>>();

        if future.iter().any(|p| !p.predicted.is_finite()) {
            return Err(PipelineError::model(format!(
                "{}: forecast produced non-finite values",
                model.symbol
            )));
        }

        let skip = model.fitted.len().saturating_sub(self.config.history_tail);
        let history = model.fitted[skip..]
            .iter()
            .map(|&(timestamp, predicted)| ForecastPoint {
                timestamp,
                predicted,
                lower: predicted - base_width,
                upper: predicted + base_width,
            })
            .collect();

        Ok(Forecast::new(model.symbol.clone(), history, future))
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}
