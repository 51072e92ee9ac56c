pub mod config;
pub mod document;
pub mod extractor;
pub mod fetcher;
pub mod formatter;
pub mod models;
pub mod notifier;
pub mod poller;
pub mod price;
pub mod seen_index;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use extractor::ListingExtractor;
pub use formatter::NotificationFormatter;
pub use models::{Listing, ListingFormat, SearchSpec};
pub use poller::{CycleReport, Poller};
pub use price::parse_price;
pub use seen_index::SeenIndex;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
