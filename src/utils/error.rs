use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Fetch error: {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Notification send error: {0}")]
    NotificationSend(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn fetch(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        AppError::Parse {
            message: message.into(),
        }
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
