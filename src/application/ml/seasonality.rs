use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

pub const DAILY_PERIOD_DAYS: f64 = 1.0;
pub const WEEKLY_PERIOD_DAYS: f64 = 7.0;

/// Whether a seasonal component is included in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonalityMode {
    /// Included when the history covers at least two full periods.
    Auto,
    /// Included once the history covers one full period.
    On,
    Off,
}

impl FromStr for SeasonalityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(SeasonalityMode::Auto),
            "on" | "true" => Ok(SeasonalityMode::On),
            "off" | "false" => Ok(SeasonalityMode::Off),
            _ => Err(anyhow!(
                "Invalid seasonality mode: '{}'. Must be 'auto', 'on' or 'off'",
                s
            )),
        }
    }
}

impl fmt::Display for SeasonalityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonalityMode::Auto => write!(f, "auto"),
            SeasonalityMode::On => write!(f, "on"),
            SeasonalityMode::Off => write!(f, "off"),
        }
    }
}

/// Fourier series for one seasonal period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTerm {
    pub period_days: f64,
    pub order: usize,
}

impl SeasonalTerm {
    pub fn new(period_days: f64, order: usize) -> Self {
        Self { period_days, order }
    }

    /// Number of regression columns this term contributes.
    pub fn width(&self) -> usize {
        self.order * 2
    }

    /// Decides whether the term belongs in a model.
    ///
    /// `span_days` is the history length, `step_days` the sampling interval.
    /// Sampling at or above the period makes the Fourier columns constant, so
    /// the term is never included in that case. A history shorter than one
    /// period leaves the sin/cos columns nearly collinear with the trend, so
    /// even `On` needs a full period.
    pub fn is_enabled(&self, mode: SeasonalityMode, span_days: f64, step_days: f64) -> bool {
        if self.order == 0 || step_days >= self.period_days {
            return false;
        }
        match mode {
            SeasonalityMode::Off => false,
            SeasonalityMode::On => span_days >= self.period_days,
            SeasonalityMode::Auto => span_days >= 2.0 * self.period_days,
        }
    }

    /// Appends `sin`/`cos` pairs for harmonics 1..=order at absolute time `t_days`.
    pub fn push_features(&self, t_days: f64, row: &mut Vec<f64>) {
        for k in 1..=self.order {
            let angle = 2.0 * PI * k as f64 * t_days / self.period_days;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("AUTO".parse::<SeasonalityMode>().unwrap(), SeasonalityMode::Auto);
        assert_eq!("on".parse::<SeasonalityMode>().unwrap(), SeasonalityMode::On);
        assert_eq!("false".parse::<SeasonalityMode>().unwrap(), SeasonalityMode::Off);
        assert!("sometimes".parse::<SeasonalityMode>().is_err());
    }

    #[test]
    fn test_auto_requires_two_periods() {
        let daily = SeasonalTerm::new(DAILY_PERIOD_DAYS, 4);
        let one_minute = 1.0 / 1440.0;

        assert!(!daily.is_enabled(SeasonalityMode::Auto, 100.0 / 1440.0, one_minute));
        assert!(daily.is_enabled(SeasonalityMode::Auto, 2.5, one_minute));
        assert!(!daily.is_enabled(SeasonalityMode::Auto, 1.5, one_minute));
        assert!(!daily.is_enabled(SeasonalityMode::Off, 30.0, one_minute));
    }

    #[test]
    fn test_on_requires_one_full_period() {
        let daily = SeasonalTerm::new(DAILY_PERIOD_DAYS, 4);
        let weekly = SeasonalTerm::new(WEEKLY_PERIOD_DAYS, 3);
        let one_minute = 1.0 / 1440.0;

        assert!(!daily.is_enabled(SeasonalityMode::On, 99.0 / 1440.0, one_minute));
        assert!(daily.is_enabled(SeasonalityMode::On, 1.5, one_minute));
        assert!(!weekly.is_enabled(SeasonalityMode::On, 1.5, one_minute));
        assert!(weekly.is_enabled(SeasonalityMode::On, 7.0, one_minute));
    }

    #[test]
    fn test_disabled_when_sampling_is_too_coarse() {
        let daily = SeasonalTerm::new(DAILY_PERIOD_DAYS, 4);
        assert!(!daily.is_enabled(SeasonalityMode::On, 100.0, 1.0));

        let weekly = SeasonalTerm::new(WEEKLY_PERIOD_DAYS, 3);
        assert!(weekly.is_enabled(SeasonalityMode::Auto, 100.0, 1.0));
    }

    #[test]
    fn test_features_width_and_range() {
        let weekly = SeasonalTerm::new(WEEKLY_PERIOD_DAYS, 3);
        let mut row = Vec::new();
        weekly.push_features(19_723.25, &mut row);

        assert_eq!(row.len(), weekly.width());
        assert!(row.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}
