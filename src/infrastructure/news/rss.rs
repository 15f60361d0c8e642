use crate::domain::errors::PipelineError;
use crate::domain::news::NewsItem;
use crate::domain::ports::NewsFeed;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, map_request_error, read_success_body,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rss::Channel;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

const SOURCE: &str = "RSS";

/// Reads headlines out of an RSS 2.0 document. The channel title becomes the item source.
pub fn parse_channel(
    body: &str,
    retrieved_at: DateTime<Utc>,
) -> Result<Vec<NewsItem>, PipelineError> {
    let channel = Channel::read_from(Cursor::new(body.as_bytes()))
        .map_err(|e| PipelineError::bad_response(SOURCE, format!("invalid channel: {}", e)))?;

    let source = match channel.title().trim() {
        "" => SOURCE.to_string(),
        title => title.to_string(),
    };

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim();
            if title.is_empty() {
                return None;
            }
            Some(NewsItem {
                title: title.to_string(),
                source: source.clone(),
                url: item.link().unwrap_or_default().to_string(),
                retrieved_at,
            })
        })
        .collect())
}

pub struct RssNewsFeed {
    url: String,
    client: Client,
}

impl RssNewsFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        Ok(Self {
            url: url.into(),
            client: HttpClientFactory::create_client(timeout)?,
        })
    }
}

#[async_trait]
impl NewsFeed for RssNewsFeed {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>, PipelineError> {
        debug!("Polling RSS feed: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| map_request_error(SOURCE, e))?;
        let body = read_success_body(SOURCE, response).await?;
        let items = parse_channel(&body, Utc::now())?;

        info!("RSS feed {} returned {} items", self.url, items.len());
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
    fn test_parse_channel() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Crypto Wire</title>
    <link>https://example.com</link>
    <description>Headlines</description>
    <item>
      <title>Bitcoin ETF inflows hit record</title>
      <link>https://example.com/a</link>
    </item>
    <item>
      <description>No title here</description>
    </item>
    <item>
      <title>Solana network upgrade ships</title>
    </item>
  </channel>
</rss>"#;
        let items = parse_channel(body, Utc::now()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "Crypto Wire");
        assert_eq!(items[0].url, "https://example.com/a");
        assert_eq!(items[1].title, "Solana network upgrade ships");
        assert_eq!(items[1].url, "");
    }

    #[test]
    fn test_parse_channel_rejects_garbage() {
        assert!(matches!(
            parse_channel("{\"results\": []}", Utc::now()),
            Err(PipelineError::BadResponse { .. })
        ));
    }
}
