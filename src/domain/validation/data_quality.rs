use crate::domain::market::Candle;
use tracing::warn;

/// Centralized validator for candle integrity.
///
/// Rejects data that is physically impossible: non-positive prices, negative
/// volume, non-finite values, or open/close outside the low/high range.
pub struct StrictCandleValidator;

impl StrictCandleValidator {
    /// Returns the reason a candle is invalid, if any.
    pub fn check(candle: &Candle) -> Result<(), String> {
        let prices = [candle.open, candle.high, candle.low, candle.close];

        if prices.iter().chain(std::iter::once(&candle.volume)).any(|v| !v.is_finite()) {
            return Err("non-finite value".to_string());
        }

        if prices.iter().any(|p| *p <= 0.0) {
            return Err("non-positive price component(s)".to_string());
        }

        if candle.volume < 0.0 {
            return Err(format!("negative volume: {}", candle.volume));
        }

        if candle.low > candle.high {
            return Err(format!("low {} > high {}", candle.low, candle.high));
        }

        for (name, value) in [("open", candle.open), ("close", candle.close)] {
            if value < candle.low || value > candle.high {
                return Err(format!(
                    "{} {} outside range [{}, {}]",
                    name, value, candle.low, candle.high
                ));
            }
        }

        Ok(())
    }

    /// Validates a candle, logging the rejection reason.
    pub fn validate_candle(symbol: &str, candle: &Candle) -> bool {
        match Self::check(candle) {
            Ok(()) => true,
            Err(reason) => {
                warn!(
                    "Validation FAILED: Candle for {} at {}: {}",
                    symbol, candle.timestamp, reason
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_millis_opt(1_704_067_200_000).unwrap(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn test_validate_candle_positive() {
        assert!(StrictCandleValidator::validate_candle(
            "BTCUSDT",
            &candle(50000.0, 50100.0, 49900.0, 50050.0, 1.5)
        ));
    }

    #[test]
    fn test_validate_candle_invalid_low_high() {
        // Low > High
        assert!(!StrictCandleValidator::validate_candle(
            "ETHUSDT",
            &candle(2000.0, 2000.0, 2001.0, 2000.0, 100.0)
        ));
    }

    #[test]
    fn test_validate_candle_open_outside_range() {
        let result = StrictCandleValidator::check(&candle(2100.0, 2050.0, 1990.0, 2000.0, 1.0));
        assert!(result.unwrap_err().contains("open"));
    }

    #[test]
    fn test_validate_candle_rejects_zero_price_and_nan() {
        assert!(StrictCandleValidator::check(&candle(0.0, 1.0, 0.0, 1.0, 1.0)).is_err());
        assert!(StrictCandleValidator::check(&candle(1.0, f64::NAN, 1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_validate_candle_negative_volume() {
        assert!(StrictCandleValidator::check(&candle(10.0, 11.0, 9.0, 10.0, -1.0)).is_err());
    }
}
