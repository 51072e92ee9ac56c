use serde::{Deserialize, Serialize};

/// A configured marketplace search whose result page is polled for new items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSpec {
    pub url: String,
    pub currency: String,
}

impl SearchSpec {
    pub fn new(url: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            currency: currency.into(),
        }
    }
}
