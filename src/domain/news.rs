use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub url: String,
    pub retrieved_at: DateTime<Utc>,
}

/// Wrapping cursor over the most recently fetched headline list.
pub struct NewsRotation;

impl NewsRotation {
    /// Returns the item at `index` (modulo the list length) and the index to use next time.
    pub fn select(items: &[NewsItem], index: usize) -> Option<(&NewsItem, usize)> {
        if items.is_empty() {
            return None;
        }
        let position = index % items.len();
        Some((&items[position], (position + 1) % items.len()))
    }
}
