//! Additive trend + seasonality forecaster.
//!
//! Close prices are modelled as `intercept + slope * t + Σ fourier(t)` and fitted
//! by least squares with SmartCore's linear regression. Future values are
//! produced at whole-day steps after the last observation.
//! The interval half-width for future step `k` is `z * σ * sqrt(1 + k)`, with σ
//! the in-sample residual standard deviation, so it never shrinks with horizon.

use super::horizon::{DEFAULT_Z, MIN_OBSERVATIONS, future_timestamps, interval_z};
use super::seasonality::{
    DAILY_PERIOD_DAYS, SeasonalTerm, SeasonalityMode, WEEKLY_PERIOD_DAYS,
};
use crate::domain::errors::PipelineError;
use crate::domain::forecast::{Forecast, ForecastPoint};
use crate::domain::market::CandleSeries;
use crate::domain::ports::ForecastEngine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use tracing::{debug, warn};

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Probability mass covered by [lower, upper], in (0, 1).
    pub interval_width: f64,
    /// In-sample points kept in the forecast output.
    pub history_tail: usize,
    pub daily_seasonality: SeasonalityMode,
    pub weekly_seasonality: SeasonalityMode,
    pub daily_fourier_order: usize,
    pub weekly_fourier_order: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            interval_width: 0.8,
            history_tail: 100,
            daily_seasonality: SeasonalityMode::Auto,
            weekly_seasonality: SeasonalityMode::Auto,
            daily_fourier_order: 4,
            weekly_fourier_order: 3,
        }
    }
}

type Regression = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Model fitted by [`TrendSeasonalityForecaster::fit`].
#[derive(Debug)]
pub struct TrendModel {
    symbol: String,
    origin: DateTime<Utc>,
    span_days: f64,
    last_timestamp: DateTime<Utc>,
    y_scale: f64,
    terms: Vec<SeasonalTerm>,
    regression: Regression,
    residual_std: f64,
    fitted: Vec<(DateTime<Utc>, f64)>,
}

impl TrendModel {
    pub fn observations(&self) -> usize {
        self.fitted.len()
    }

    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }

    pub fn seasonal_terms(&self) -> &[SeasonalTerm] {
        &self.terms
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.last_timestamp
    }

    fn feature_row(&self, timestamp: DateTime<Utc>) -> Vec<f64> {
        feature_row(self.origin, self.span_days, &self.terms, timestamp)
    }
}

fn feature_row(
    origin: DateTime<Utc>,
    span_days: f64,
    terms: &[SeasonalTerm],
    timestamp: DateTime<Utc>,
) -> Vec<f64> {
    let elapsed_days = (timestamp - origin).num_milliseconds() as f64 / MS_PER_DAY;
    let absolute_days = timestamp.timestamp_millis() as f64 / MS_PER_DAY;

    let mut row = Vec::with_capacity(1 + terms.iter().map(|t| t.width()).sum::<usize>());
    row.push(elapsed_days / span_days);
    for term in terms {
        term.push_features(absolute_days, &mut row);
    }
    row
}

pub struct TrendSeasonalityForecaster {
    config: ForecastConfig,
    z: f64,
}

impl TrendSeasonalityForecaster {
    pub fn new(config: ForecastConfig) -> Result<Self, PipelineError> {
        let z = interval_z(config.interval_width)?;
        Ok(Self { config, z })
    }

    fn active_terms(&self, series: &CandleSeries, span_days: f64) -> Vec<SeasonalTerm> {
        let step_days = series.interval().to_minutes() as f64 / 1440.0;
        let candidates = [
            (
                SeasonalTerm::new(DAILY_PERIOD_DAYS, self.config.daily_fourier_order),
                self.config.daily_seasonality,
            ),
            (
                SeasonalTerm::new(WEEKLY_PERIOD_DAYS, self.config.weekly_fourier_order),
                self.config.weekly_seasonality,
            ),
        ];

        let mut terms = Vec::new();
        let mut width = 1;
        for (term, mode) in candidates {
            if mode == SeasonalityMode::On
                && term.order > 0
                && step_days < term.period_days
                && span_days < term.period_days
            {
                warn!(
                    "{}: {}-day seasonality forced on but history spans {:.2} days, skipped",
                    series.symbol(),
                    term.period_days,
                    span_days
                );
            }
            // Keep at least one residual degree of freedom
            if term.is_enabled(mode, span_days, step_days) && width + term.width() + 1 < series.len()
            {
                width += term.width();
                terms.push(term);
            }
        }
        terms
    }
}

impl Default for TrendSeasonalityForecaster {
    fn default() -> Self {
        Self {
            config: ForecastConfig::default(),
            z: DEFAULT_Z,
        }
    }
}

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, PipelineError> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| PipelineError::model(format!("Matrix creation failed: {}", e)))
}

impl ForecastEngine for TrendSeasonalityForecaster {
    type Model = TrendModel;

    fn fit(&self, series: &CandleSeries) -> Result<TrendModel, PipelineError> {
        if series.len() < MIN_OBSERVATIONS {
            return Err(PipelineError::InsufficientData {
                symbol: series.symbol().to_string(),
                required: MIN_OBSERVATIONS,
                available: series.len(),
            });
        }

        let candles = series.candles();
        let origin = candles[0].timestamp;
        let last_timestamp = candles[candles.len() - 1].timestamp;
        let span_days = (last_timestamp - origin).num_milliseconds() as f64 / MS_PER_DAY;
        let terms = self.active_terms(series, span_days);

        let closes = series.closes();
        let y_scale = closes.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if y_scale <= 0.0 || !y_scale.is_finite() {
            return Err(PipelineError::model(format!(
                "{}: close prices cannot be scaled (max {})",
                series.symbol(),
                y_scale
            )));
        }
        let y: Vec<f64> = closes.iter().map(|v| v / y_scale).collect();

        let rows: Vec<Vec<f64>> = candles
            .iter()
            .map(|c| feature_row(origin, span_days, &terms, c.timestamp))
            .collect();
        let x = to_matrix(&rows)?;

        let params =
            LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
        let regression = LinearRegression::fit(&x, &y, params)
            .map_err(|e| PipelineError::model(format!("Regression fit failed: {}", e)))?;

        let in_sample = regression
            .predict(&x)
            .map_err(|e| PipelineError::model(format!("Prediction failed: {}", e)))?;
        if in_sample.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::model(format!(
                "{}: regression produced non-finite values",
                series.symbol()
            )));
        }

        let sse: f64 = in_sample
            .iter()
            .zip(&y)
            .map(|(fit, obs)| (obs - fit).powi(2))
            .sum();
        let parameters = rows[0].len() + 1;
        let dof = if series.len() > parameters {
            series.len() - parameters
        } else {
            series.len()
        };
        let residual_std = (sse / dof as f64).sqrt() * y_scale;

        let fitted = candles
            .iter()
            .zip(&in_sample)
            .map(|(c, v)| (c.timestamp, v * y_scale))
            .collect();

        debug!(
            "TrendSeasonalityForecaster: {} fitted on {} obs ({} seasonal terms), σ={:.6}",
            series.symbol(),
            series.len(),
            terms.len(),
            residual_std
        );

        Ok(TrendModel {
            symbol: series.symbol().to_string(),
            origin,
            span_days: if span_days > 0.0 { span_days } else { 1.0 },
            last_timestamp,
            y_scale,
            terms,
            regression,
            residual_std,
            fitted,
        })
    }

    fn predict(&self, model: &TrendModel, horizon_days: u32) -> Result<Forecast, PipelineError> {
        if model.observations() < MIN_OBSERVATIONS {
            return Err(PipelineError::InsufficientData {
                symbol: model.symbol.clone(),
                required: MIN_OBSERVATIONS,
                available: model.observations(),
            });
        }
        let future_timestamps = future_timestamps(model.last_timestamp, horizon_days)?;

        let rows: Vec<Vec<f64>> = future_timestamps
            .iter()
            .map(|ts| model.feature_row(*ts))
            .collect();
        let predictions = model
            .regression
            .predict(&to_matrix(&rows)?)
            .map_err(|e| PipelineError::model(format!("Prediction failed: {}", e)))?;

        let base_width = self.z * model.residual_std;

        let future = future_timestamps
            .into_iter()
            .zip(predictions)
            .enumerate()
            .map(|(i, (timestamp, scaled))| {
                let predicted = scaled * model.y_scale;
                let half_width = base_width * ((i + 2) as f64).sqrt();
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
        "Trend + Seasonality (SmartCore OLS)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{Candle, Interval};
    use crate::infrastructure::mock::synthetic_series;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn series(interval: Interval, closes: &[f64], start: DateTime<Utc>) -> CandleSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + interval.duration() * i as i32,
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1.0,
            })
            .collect();
        CandleSeries::new("BTCUSDT", interval, candles).unwrap()
    }

    fn noisy_trend(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 40_000.0 + i as f64 * 3.0 + ((i * 7919) % 13) as f64 - 6.0)
            .collect()
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 21, 0, 0).unwrap()
    }

    #[test]
    fn test_fit_rejects_single_observation() {
        let engine = TrendSeasonalityForecaster::default();
        let one = series(Interval::OneMin, &[100.0], start());

        let err = engine.fit(&one).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                required: 2,
                available: 1,
                ..
            }
        ));

        let empty = series(Interval::OneMin, &[], start());
        assert!(matches!(
            engine.fit(&empty),
            Err(PipelineError::InsufficientData { available: 0, .. })
        ));
    }

    #[test]
    fn test_two_observations_are_enough() {
        let engine = TrendSeasonalityForecaster::default();
        let model = engine
            .fit(&series(Interval::OneMin, &[100.0, 101.0], start()))
            .unwrap();
        let forecast = engine.predict(&model, 3).unwrap();
        assert_eq!(forecast.future().len(), 3);
    }

    #[test]
    fn test_future_points_are_consecutive_calendar_days() {
        let engine = TrendSeasonalityForecaster::default();
        let model = engine
            .fit(&series(Interval::FiveMin, &noisy_trend(120), start()))
            .unwrap();
        let forecast = engine.predict(&model, 10).unwrap();
        let future = forecast.future();

        assert_eq!(future.len(), 10);
        // Last observation is 2024-06-11 06:55 UTC
        assert_eq!(
            future[0].timestamp.date_naive(),
            NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
        );
        for pair in future.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::days(1));
        }
        assert_eq!(future[0].timestamp - model.last_timestamp(), Duration::days(1));
        assert!(future.iter().all(|p| p.timestamp > model.last_timestamp()));
    }

    #[test]
    fn test_interval_widens_with_horizon() {
        let engine = TrendSeasonalityForecaster::default();
        let model = engine
            .fit(&series(Interval::OneHour, &noisy_trend(200), start()))
            .unwrap();
        let forecast = engine.predict(&model, 14).unwrap();

        assert!(model.residual_std() > 0.0);
        for p in forecast.points() {
            assert!(p.lower <= p.predicted && p.predicted <= p.upper);
        }
        for pair in forecast.future().windows(2) {
            assert!(pair[1].half_width() >= pair[0].half_width());
        }
    }

    #[test]
    fn test_linear_trend_is_extrapolated() {
        let engine = TrendSeasonalityForecaster::default();
        // +24 per day on hourly candles
        let closes: Vec<f64> = (0..48).map(|i| 1_000.0 + i as f64).collect();
        let begin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let model = engine
            .fit(&series(Interval::OneHour, &closes, begin))
            .unwrap();
        let forecast = engine.predict(&model, 1).unwrap();

        // Last close at 2024-01-02 23:00; one day later is 71 hours after start
        let p = forecast.future()[0];
        assert!((p.predicted - 1_071.0).abs() < 1e-6, "got {}", p.predicted);
        assert!(p.half_width() < 1e-6);
    }

    #[test]
    fn test_history_tail_is_truncated() {
        let config = ForecastConfig {
            history_tail: 25,
            ..ForecastConfig::default()
        };
        let engine = TrendSeasonalityForecaster::new(config).unwrap();
        let input = series(Interval::OneMin, &noisy_trend(100), start());
        let model = engine.fit(&input).unwrap();
        let forecast = engine.predict(&model, 2).unwrap();

        assert_eq!(forecast.history().len(), 25);
        assert_eq!(
            forecast.history().last().unwrap().timestamp,
            input.last().unwrap().timestamp
        );
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let engine = TrendSeasonalityForecaster::default();
        let model = engine
            .fit(&series(Interval::OneMin, &noisy_trend(10), start()))
            .unwrap();
        assert!(matches!(
            engine.predict(&model, 0),
            Err(PipelineError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_seasonality_enabled_on_long_daily_history() {
        let engine = TrendSeasonalityForecaster::default();
        let closes: Vec<f64> = (0..60)
            .map(|i| 500.0 + (i % 7) as f64 * 4.0 + i as f64 * 0.5)
            .collect();
        let model = engine
            .fit(&series(Interval::OneDay, &closes, start()))
            .unwrap();

        // Daily term is degenerate on daily candles; weekly is kept
        assert_eq!(model.seasonal_terms().len(), 1);
        assert_eq!(model.seasonal_terms()[0].period_days, WEEKLY_PERIOD_DAYS);

        let forecast = engine.predict(&model, 7).unwrap();
        assert!(forecast.future().iter().all(|p| p.predicted.is_finite()));
    }

    #[test]
    fn test_forced_seasonality_on_short_history_stays_near_trend() {
        let t = Utc.with_ymd_and_hms(2024, 3, 14, 15, 37, 0).unwrap();
        let input = synthetic_series("BTCUSDT", Interval::OneMin, 100, t).unwrap();
        let last_close = input.last().unwrap().close;

        let forced = TrendSeasonalityForecaster::new(ForecastConfig {
            daily_seasonality: SeasonalityMode::On,
            weekly_seasonality: SeasonalityMode::On,
            ..ForecastConfig::default()
        })
        .unwrap();
        let forced_model = forced.fit(&input).unwrap();
        assert!(forced_model.seasonal_terms().is_empty());
        let forced_forecast = forced.predict(&forced_model, 7).unwrap();

        let baseline = TrendSeasonalityForecaster::default();
        let baseline_forecast = baseline
            .predict(&baseline.fit(&input).unwrap(), 7)
            .unwrap();

        for (p, b) in forced_forecast.future().iter().zip(baseline_forecast.future()) {
            assert!((p.predicted - b.predicted).abs() < 1e-6);
            // The synthetic trend gains ~0.1% of base per minute
            assert!(
                p.predicted > last_close && p.predicted < last_close * 20.0,
                "{} vs last close {}",
                p.predicted,
                last_close
            );
            assert!(p.half_width() < last_close);
        }
    }

    #[test]
    fn test_horizon_above_cap_rejected() {
        let engine = TrendSeasonalityForecaster::default();
        let model = engine
            .fit(&series(Interval::OneMin, &noisy_trend(10), start()))
            .unwrap();
        assert!(matches!(
            engine.predict(&model, 50_000_000),
            Err(PipelineError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_default_z_matches_configured_width() {
        let built = TrendSeasonalityForecaster::new(ForecastConfig::default()).unwrap();
        let default = TrendSeasonalityForecaster::default();
        assert!((built.z - default.z).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_interval_width() {
        let config = ForecastConfig {
            interval_width: 1.0,
            ..ForecastConfig::default()
        };
        assert!(TrendSeasonalityForecaster::new(config).is_err());
    }
}
