use crate::domain::errors::PipelineError;
use crate::domain::news::NewsItem;
use crate::domain::ports::NewsFeed;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory [`NewsFeed`] returning a fixed headline list, with optional
/// one-shot scripted failures.
#[derive(Clone)]
pub struct MockNewsFeed {
    headlines: Vec<(String, String)>,
    failures: Arc<Mutex<VecDeque<PipelineError>>>,
    fetches: Arc<Mutex<usize>>,
}

impl MockNewsFeed {
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headlines: titles
                .into_iter()
                .map(|t| (t.into(), "MockWire".to_string()))
                .collect(),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    pub async fn push_failure(&self, error: PipelineError) {
        self.failures.lock().await.push_back(error);
    }

    pub async fn fetch_count(&self) -> usize {
        *self.fetches.lock().await
    }
}

impl Default for MockNewsFeed {
    fn default() -> Self {
        Self::new([
            "Bitcoin surges to new all-time high as adoption grows",
            "Exchange hacked, funds stolen in overnight exploit",
            "Market closes unchanged from previous session",
        ])
    }
}

#[async_trait]
impl NewsFeed for MockNewsFeed {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>, PipelineError> {
        *self.fetches.lock().await += 1;
        if let Some(error) = self.failures.lock().await.pop_front() {
            return Err(error);
        }

        let now = Utc::now();
        Ok(self
            .headlines
            .iter()
            .enumerate()
            .map(|(i, (title, source))| NewsItem {
                title: title.clone(),
                source: source.clone(),
                url: format!("https://news.invalid/{}", i),
                retrieved_at: now,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
