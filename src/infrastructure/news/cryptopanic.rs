use crate::domain::errors::PipelineError;
use crate::domain::news::NewsItem;
use crate::domain::ports::NewsFeed;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, map_request_error, read_success_body,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const SOURCE: &str = "CryptoPanic";

pub const DEFAULT_CRYPTOPANIC_URL: &str = "https://cryptopanic.com/api/v1/posts/";

#[derive(Debug, Deserialize)]
struct CryptoPanicResponse {
    #[serde(default)]
    results: Vec<CryptoPanicPost>,
}

#[derive(Debug, Deserialize)]
struct CryptoPanicPost {
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<CryptoPanicSource>,
}

#[derive(Debug, Deserialize)]
struct CryptoPanicSource {
    title: Option<String>,
}

/// Parses a CryptoPanic posts body. Posts with a blank title are skipped.
pub fn parse_posts(
    body: &str,
    retrieved_at: DateTime<Utc>,
) -> Result<Vec<NewsItem>, PipelineError> {
    let response: CryptoPanicResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::bad_response(SOURCE, format!("posts body: {}", e)))?;

    Ok(response
        .results
        .into_iter()
        .filter(|post| !post.title.trim().is_empty())
        .map(|post| NewsItem {
            title: post.title.trim().to_string(),
            source: post
                .source
                .and_then(|s| s.title)
                .unwrap_or_else(|| SOURCE.to_string()),
            url: post.url.unwrap_or_default(),
            retrieved_at,
        })
        .collect())
}

pub struct CryptoPanicNewsFeed {
    client: Client,
    url: String,
    auth_token: Option<String>,
}

impl CryptoPanicNewsFeed {
    pub fn new(
        url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client: HttpClientFactory::create_client(timeout)?,
            url: url.into(),
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        })
    }
}

#[async_trait]
impl NewsFeed for CryptoPanicNewsFeed {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>, PipelineError> {
        debug!("Fetching headlines from CryptoPanic: {}", self.url);

        let mut request = self.client.get(&self.url).query(&[("public", "true")]);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth_token", token.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(SOURCE, e))?;
        let body = read_success_body(SOURCE, response).await?;
        let items = parse_posts(&body, Utc::now())?;

        info!("Fetched {} headlines from CryptoPanic", items.len());
        Ok(items)
    }

    fn name(&self) -> &str {
        SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_posts() {
        let body = r#"{
            "count": 2,
            "results": [
                {"title": "Bitcoin rallies past resistance", "url": "https://cryptopanic.com/news/1", "source": {"title": "CoinDesk", "domain": "coindesk.com"}},
                {"title": "  ", "url": "https://cryptopanic.com/news/2"},
                {"title": "ETH gas fees fall", "source": {"title": null}}
            ]
        }"#;
        let now = Utc::now();
        let items = parse_posts(body, now).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Bitcoin rallies past resistance");
        assert_eq!(items[0].source, "CoinDesk");
        assert_eq!(items[0].retrieved_at, now);
        assert_eq!(items[1].source, "CryptoPanic");
        assert_eq!(items[1].url, "");
    }

    #[test]
    fn test_parse_posts_empty_results() {
        assert!(parse_posts(r#"{"results": []}"#, Utc::now()).unwrap().is_empty());
        assert!(parse_posts("{}", Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_posts_malformed() {
        assert!(matches!(
            parse_posts(r#"{"results": "nope"}"#, Utc::now()),
            Err(PipelineError::BadResponse { .. })
        ));
        assert!(parse_posts("<html>", Utc::now()).is_err());
    }
}
