//! Tool implementations module

pub(crate) mod html;
pub mod resize;
pub mod scrape;
pub mod sentiment;
pub mod summarize;
pub mod translate;

// Re-export for convenience
pub use resize::ResizeOperation;
pub use scrape::ScrapeOperation;
pub use sentiment::SentimentOperation;
pub use summarize::SummarizeOperation;
pub use translate::TranslateOperation;
