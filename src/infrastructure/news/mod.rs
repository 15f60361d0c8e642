pub mod cryptopanic;
pub mod mock_news;
pub mod rss;
pub mod sentiment_analyzer;

pub use cryptopanic::CryptoPanicNewsFeed;
pub use mock_news::MockNewsFeed;
pub use rss::RssNewsFeed;
pub use sentiment_analyzer::VaderSentimentScorer;
