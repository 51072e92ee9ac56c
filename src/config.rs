use config::{Config, ConfigError, Environment, File};
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::formatter::DEFAULT_TEMPLATE;
use crate::models::SearchSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub searches: Vec<SearchSpec>,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub delay_secs: u64,
    pub link_selector: String,
    pub item_url_pattern: String,
    pub ignore_listing: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub tls: SmtpTls,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plaintext greeting upgraded with STARTTLS, usually port 587.
    #[default]
    StartTls,
    /// TLS from the first byte (SMTPS), usually port 465.
    Wrapper,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub track_seen: bool,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Oldest listings are dropped once this many are waiting to be pulled.
    pub buffer_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub request_timeout: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            delay_secs: 300,
            link_selector: "a.s-item__link".to_string(),
            item_url_pattern: "/itm/".to_string(),
            ignore_listing: Some("https://ebay.com/itm/123456".to_string()),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: None,
            to_address: None,
            tls: SmtpTls::StartTls,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            track_seen: true,
            path: PathBuf::from("scraped.json"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "0.0.0.0".to_string(),
            port: 8080,
            buffer_capacity: 1000,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".to_string(),
            request_timeout: 30,
        }
    }
}

fn default_message() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Layered load: `config/default`, then `path` if given, then `MONITOR__*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let s = builder
            // Add environment variables with prefix "MONITOR_"
            .add_source(Environment::with_prefix("MONITOR").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate searches
        if self.searches.is_empty() {
            return Err(ConfigError::Message("At least one search must be configured".into()));
        }

        for search in &self.searches {
            if Url::parse(&search.url).is_err() {
                return Err(ConfigError::Message(format!("Invalid search URL: {}", search.url)));
            }
            if search.currency.trim().is_empty() {
                return Err(ConfigError::Message(format!("Search {} has no currency", search.url)));
            }
        }

        // Validate poller configuration
        if self.poller.delay_secs == 0 {
            return Err(ConfigError::Message("Poller delay_secs must be greater than 0".into()));
        }

        if Selector::parse(&self.poller.link_selector).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid link selector: {}",
                self.poller.link_selector
            )));
        }

        if let Err(e) = Regex::new(&self.poller.item_url_pattern) {
            return Err(ConfigError::Message(format!("Invalid item_url_pattern: {}", e)));
        }

        // Validate server configuration
        if self.server.enabled && self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }
        if self.server.enabled && self.server.buffer_capacity == 0 {
            return Err(ConfigError::Message("Server buffer_capacity must be greater than 0".into()));
        }

        // Validate SMTP configuration
        if self.notifications.enabled {
            let smtp = &self.notifications.smtp;
            if smtp.host.trim().is_empty() {
                return Err(ConfigError::Message("SMTP host is required when notifications are enabled".into()));
            }
            if smtp.port == 0 {
                return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
            }
            if smtp.to_address.is_none() {
                return Err(ConfigError::Message("SMTP to_address is required when notifications are enabled".into()));
            }
            if smtp.from_address.is_none() && smtp.username.is_none() {
                return Err(ConfigError::Message("SMTP from_address or username is required".into()));
            }
        }

        Ok(())
    }
}
