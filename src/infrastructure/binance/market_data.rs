//! Binance Market Data Client
//!
//! Provides the REST side of the Binance public API:
//! - Historical candle data (klines)
//! - Instantaneous symbol price

use crate::domain::errors::PipelineError;
use crate::domain::market::{Candle, CandleSeries, Interval};
use crate::domain::ports::MarketDataClient;
use crate::domain::refresh::MAX_CANDLE_LIMIT;
use crate::domain::validation::data_quality::StrictCandleValidator;
use crate::infrastructure::core::http_client_factory::{
    DEFAULT_REQUEST_TIMEOUT, HttpClientFactory, map_request_error, read_success_body,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const SOURCE: &str = "Binance";

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

pub struct BinanceMarketDataClient {
    client: Client,
    base_url: String,
}

impl BinanceMarketDataClient {
    pub fn builder() -> BinanceMarketDataClientBuilder {
        BinanceMarketDataClientBuilder::default()
    }
}

#[derive(Default)]
pub struct BinanceMarketDataClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl BinanceMarketDataClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<BinanceMarketDataClient, PipelineError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client =
            HttpClientFactory::create_client(self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))?;

        Ok(BinanceMarketDataClient { client, base_url })
    }
}

/// Converts user-facing symbols ("btc/usdt") to the exchange form ("BTCUSDT").
pub fn to_exchange_symbol(symbol: &str) -> Result<String, PipelineError> {
    let normalized: String = symbol
        .trim()
        .chars()
        .filter(|c| *c != '/' && *c != '-')
        .collect::<String>()
        .to_uppercase();

    if normalized.is_empty() {
        return Err(PipelineError::bad_response(SOURCE, "symbol must not be empty"));
    }
    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PipelineError::bad_response(
            SOURCE,
            format!("symbol {:?} contains invalid characters", symbol),
        ));
    }
    Ok(normalized)
}

/// Accepts numeric fields transmitted either as JSON strings or numbers.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parses a klines body: `[[openTime, open, high, low, close, volume, closeTime, ...], ...]`.
///
/// Rows with the wrong shape fail the whole response; rows that parse but
/// violate candle invariants are dropped with a warning.
pub fn parse_klines(
    symbol: &str,
    interval: Interval,
    body: &str,
) -> Result<CandleSeries, PipelineError> {
    let rows: Vec<Value> = serde_json::from_str(body).map_err(|e| {
        PipelineError::bad_response(SOURCE, format!("klines body is not a JSON array: {}", e))
    })?;

    let mut candles = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let arr = row.as_array().filter(|a| a.len() >= 6).ok_or_else(|| {
            PipelineError::bad_response(SOURCE, format!("kline row #{} is not a 6+ field array", i))
        })?;

        let field = |idx: usize, name: &str| {
            coerce_f64(&arr[idx]).ok_or_else(|| {
                PipelineError::bad_response(
                    SOURCE,
                    format!("kline row #{} has non-numeric {}: {}", i, name, arr[idx]),
                )
            })
        };

        let open_time = coerce_i64(&arr[0]).ok_or_else(|| {
            PipelineError::bad_response(SOURCE, format!("kline row #{} has invalid open time", i))
        })?;
        let timestamp = Utc.timestamp_millis_opt(open_time).single().ok_or_else(|| {
            PipelineError::bad_response(
                SOURCE,
                format!("kline row #{} open time {} out of range", i, open_time),
            )
        })?;

        let candle = Candle {
            timestamp,
            open: field(1, "open")?,
            high: field(2, "high")?,
            low: field(3, "low")?,
            close: field(4, "close")?,
            volume: field(5, "volume")?,
        };

        if StrictCandleValidator::validate_candle(symbol, &candle) {
            candles.push(candle);
        }
    }

    if candles.len() < rows.len() {
        warn!(
            "BinanceMarketDataClient: Dropped {} invalid candle(s) for {}",
            rows.len() - candles.len(),
            symbol
        );
    }

    CandleSeries::new(symbol, interval, candles)
        .map_err(|e| PipelineError::bad_response(SOURCE, e.to_string()))
}

#[derive(Debug, Deserialize)]
struct PriceTicker {
    price: Value,
}

/// Parses `{"price": "<decimal>"}`.
pub fn parse_price(symbol: &str, body: &str) -> Result<f64, PipelineError> {
    let ticker: PriceTicker = serde_json::from_str(body).map_err(|e| {
        PipelineError::bad_response(SOURCE, format!("price body for {}: {}", symbol, e))
    })?;

    match coerce_f64(&ticker.price) {
        Some(price) if price.is_finite() && price > 0.0 => Ok(price),
        _ => Err(PipelineError::bad_response(
            SOURCE,
            format!("invalid price for {}: {}", symbol, ticker.price),
        )),
    }
}

#[async_trait]
impl MarketDataClient for BinanceMarketDataClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, PipelineError> {
        let api_symbol = to_exchange_symbol(symbol)?;
        if limit == 0 || limit > MAX_CANDLE_LIMIT {
            return Err(PipelineError::bad_response(
                SOURCE,
                format!("limit must be within 1..={}, got {}", MAX_CANDLE_LIMIT, limit),
            ));
        }

        let url = format!("{}/api/v3/klines", self.base_url);
        let limit_str = limit.to_string();
        debug!(
            "BinanceMarketDataClient: GET {} symbol={} interval={} limit={}",
            url, api_symbol, interval, limit
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", api_symbol.as_str()),
                ("interval", interval.to_binance_string()),
                ("limit", limit_str.as_str()),
            ])
            .send()
            .await
            .map_err(|e| map_request_error(SOURCE, e))?;

        let body = read_success_body(SOURCE, response).await?;
        let series = parse_klines(&api_symbol, interval, &body)?;

        info!(
            "BinanceMarketDataClient: Fetched {} bars for {}",
            series.len(),
            api_symbol
        );

        Ok(series)
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, PipelineError> {
        let api_symbol = to_exchange_symbol(symbol)?;
        let url = format!("{}/api/v3/ticker/price", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", api_symbol.as_str())])
            .send()
            .await
            .map_err(|e| map_request_error(SOURCE, e))?;

        let body = read_success_body(SOURCE, response).await?;
        parse_price(&api_symbol, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KLINES_FIXTURE: &str = r#"[
        [1704067200000, "42000.10", "42100.00", "41950.50", "42050.00", "12.5", 1704067259999, "0", 100, "0", "0", "0"],
        [1704067260000, "42050.00", "42080.00", "42000.00", "42010.25", "8.75", 1704067319999, "0", 80, "0", "0", "0"],
        [1704067320000, 42010.25, 42030.0, 41990.0, 42020.0, 3, 1704067379999, "0", 20, "0", "0", "0"]
    ]"#;

    #[test]
    fn test_binance_symbol_normalization() {
        assert_eq!(to_exchange_symbol("BTC/USDT").unwrap(), "BTCUSDT");
        assert_eq!(to_exchange_symbol(" ethusdt ").unwrap(), "ETHUSDT");
        assert_eq!(to_exchange_symbol("AVAX-USDT").unwrap(), "AVAXUSDT");
        assert!(to_exchange_symbol("").is_err());
        assert!(to_exchange_symbol("BTC USDT&x=1").is_err());
    }

    #[test]
    fn test_parse_klines_coerces_strings_and_numbers() {
        let series = parse_klines("BTCUSDT", Interval::OneMin, KLINES_FIXTURE).unwrap();

        assert_eq!(series.len(), 3);
        let first = series.first().unwrap();
        assert_eq!(first.timestamp.timestamp_millis(), 1_704_067_200_000);
        assert_eq!(first.open, 42000.10);
        assert_eq!(first.volume, 12.5);
        assert_eq!(series.last().unwrap().close, 42020.0);

        for c in series.candles() {
            assert!(c.low <= c.open && c.open <= c.high);
            assert!(c.low <= c.close && c.close <= c.high);
        }
    }

    #[test]
    fn test_parse_klines_drops_invalid_candle() {
        let body = r#"[
            [1704067200000, "10", "11", "9", "10", "1"],
            [1704067260000, "10", "9", "11", "10", "1"],
            [1704067320000, "10", "12", "9", "11", "1"]
        ]"#;
        let series = parse_klines("BTCUSDT", Interval::OneMin, body).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_parse_klines_rejects_bad_shapes() {
        for body in [
            r#"{"code": -1121, "msg": "Invalid symbol."}"#,
            r#"[[1704067200000, "10", "11"]]"#,
            r#"[[1704067200000, "ten", "11", "9", "10", "1"]]"#,
            "not json",
        ] {
            assert!(matches!(
                parse_klines("BTCUSDT", Interval::OneMin, body),
                Err(PipelineError::BadResponse { .. })
            ));
        }
    }

    #[test]
    fn test_parse_klines_rejects_out_of_order_rows() {
        let body = r#"[
            [1704067260000, "10", "11", "9", "10", "1"],
            [1704067200000, "10", "11", "9", "10", "1"]
        ]"#;
        assert!(matches!(
            parse_klines("BTCUSDT", Interval::OneMin, body),
            Err(PipelineError::BadResponse { .. })
        ));
    }

    #[test]
    fn test_parse_klines_empty_array() {
        let series = parse_klines("BTCUSDT", Interval::OneDay, "[]").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(
            parse_price("BTCUSDT", r#"{"symbol":"BTCUSDT","price":"43210.55000000"}"#).unwrap(),
            43210.55
        );
        assert_eq!(parse_price("BTCUSDT", r#"{"price": 12.5}"#).unwrap(), 12.5);
        assert!(parse_price("BTCUSDT", r#"{"price":"abc"}"#).is_err());
        assert!(parse_price("BTCUSDT", r#"{"msg":"no price"}"#).is_err());
    }
}
