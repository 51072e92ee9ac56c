pub mod listing;
pub mod search;

// Re-exports for convenience
pub use listing::*;
pub use search::*;
