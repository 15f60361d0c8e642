//! News feed configuration parsed from environment variables.

use anyhow::Result;
use std::env;
use std::str::FromStr;

pub const DEFAULT_RSS_URL: &str = "https://www.coindesk.com/arc/outboundfeeds/rss/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsSource {
    CryptoPanic,
    Rss,
    None,
}

impl FromStr for NewsSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cryptopanic" => Ok(NewsSource::CryptoPanic),
            "rss" => Ok(NewsSource::Rss),
            "none" | "off" | "" => Ok(NewsSource::None),
            _ => anyhow::bail!(
                "Invalid NEWS_SOURCE: {}. Must be 'cryptopanic', 'rss' or 'none'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsEnvConfig {
    pub source: NewsSource,
    pub url: String,
    pub api_token: Option<String>,
}

impl NewsEnvConfig {
    pub fn from_env() -> Result<Self> {
        let source = NewsSource::from_str(
            &env::var("NEWS_SOURCE").unwrap_or_else(|_| "cryptopanic".to_string()),
        )?;

        let default_url = match source {
            NewsSource::Rss => DEFAULT_RSS_URL,
            _ => crate::infrastructure::news::cryptopanic::DEFAULT_CRYPTOPANIC_URL,
        };

        Ok(Self {
            source,
            url: env::var("NEWS_URL").unwrap_or_else(|_| default_url.to_string()),
            api_token: env::var("NEWS_API_TOKEN").ok().filter(|t| !t.trim().is_empty()),
        })
    }
}
