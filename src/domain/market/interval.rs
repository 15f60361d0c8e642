use anyhow::{Result, anyhow};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval supported by the quote source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    OneMin,
    FiveMin,
    FifteenMin,
    OneHour,
    OneDay,
}

impl Interval {
    /// Returns the duration of this interval in minutes
    pub fn to_minutes(&self) -> i64 {
        match self {
            Interval::OneMin => 1,
            Interval::FiveMin => 5,
            Interval::FifteenMin => 15,
            Interval::OneHour => 60,
            Interval::OneDay => 1440,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.to_minutes())
    }

    /// Converts to Binance API interval string
    pub fn to_binance_string(&self) -> &'static str {
        match self {
            Interval::OneMin => "1m",
            Interval::FiveMin => "5m",
            Interval::FifteenMin => "15m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
        }
    }

    /// Returns all available intervals in ascending order
    pub fn all() -> Vec<Interval> {
        vec![
            Interval::OneMin,
            Interval::FiveMin,
            Interval::FifteenMin,
            Interval::OneHour,
            Interval::OneDay,
        ]
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1min" => Ok(Interval::OneMin),
            "5m" | "5min" => Ok(Interval::FiveMin),
            "15m" | "15min" => Ok(Interval::FifteenMin),
            "1h" | "1hour" => Ok(Interval::OneHour),
            "1d" | "1day" => Ok(Interval::OneDay),
            _ => Err(anyhow!(
                "Invalid interval: '{}'. Valid options: 1m, 5m, 15m, 1h, 1d",
                s
            )),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_binance_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minutes() {
        assert_eq!(Interval::OneMin.to_minutes(), 1);
        assert_eq!(Interval::FiveMin.to_minutes(), 5);
        assert_eq!(Interval::FifteenMin.to_minutes(), 15);
        assert_eq!(Interval::OneHour.to_minutes(), 60);
        assert_eq!(Interval::OneDay.to_minutes(), 1440);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Interval::from_str("1m").unwrap(), Interval::OneMin);
        assert_eq!(Interval::from_str("1Min").unwrap(), Interval::OneMin);
        assert_eq!(Interval::from_str(" 15m ").unwrap(), Interval::FifteenMin);
        assert_eq!(Interval::from_str("1H").unwrap(), Interval::OneHour);
        assert_eq!(Interval::from_str("1d").unwrap(), Interval::OneDay);
        assert!(Interval::from_str("4h").is_err());
        assert!(Interval::from_str("").is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for interval in Interval::all() {
            assert_eq!(interval.to_string().parse::<Interval>().unwrap(), interval);
        }
    }
}
