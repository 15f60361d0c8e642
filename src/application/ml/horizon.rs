//! Pieces shared by every forecast engine: the future time grid and the
//! normal quantile behind the uncertainty band.

use crate::domain::errors::PipelineError;
use crate::domain::refresh::MAX_HORIZON_DAYS;
use chrono::{DateTime, Days, Utc};
use statrs::distribution::{ContinuousCDF, Normal};

/// Minimum number of observations a model can be fitted on.
pub const MIN_OBSERVATIONS: usize = 2;

/// Two-sided 80% normal quantile.
pub const DEFAULT_Z: f64 = 1.281_551_565_544_600_4;

/// `last + k days` for k = 1..=horizon_days, keeping the time of day.
pub fn future_timestamps(
    last: DateTime<Utc>,
    horizon_days: u32,
) -> Result<Vec<DateTime<Utc>>, PipelineError> {
    if horizon_days == 0 {
        return Err(PipelineError::invalid_request("horizon_days must be > 0"));
    }
    if horizon_days > MAX_HORIZON_DAYS {
        return Err(PipelineError::invalid_request(format!(
            "horizon_days must be at most {}, got {}",
            MAX_HORIZON_DAYS, horizon_days
        )));
    }

    (1..=u64::from(horizon_days))
        .map(|k| {
            last.checked_add_days(Days::new(k)).ok_or_else(|| {
                PipelineError::invalid_request(format!(
                    "horizon of {} days overflows the calendar",
                    horizon_days
                ))
            })
        })
        .collect()
}

/// Normal quantile covering `interval_width` of the mass, both tails split evenly.
pub fn interval_z(interval_width: f64) -> Result<f64, PipelineError> {
    if !(interval_width > 0.0 && interval_width < 1.0) {
        return Err(PipelineError::invalid_request(format!(
            "interval_width must lie in (0, 1), got {}",
            interval_width
        )));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| PipelineError::model(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + interval_width / 2.0))
}
