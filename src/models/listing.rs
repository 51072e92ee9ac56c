use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ListingFormat {
    Auction,
    #[default]
    BuyItNow,
}

impl std::fmt::Display for ListingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingFormat::Auction => write!(f, "auction"),
            ListingFormat::BuyItNow => write!(f, "buy-it-now"),
        }
    }
}

/// Snapshot of one marketplace item at scrape time.
///
/// `url` is always canonical (see [`canonicalize_url`]) and is the natural key
/// used by the seen index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub url: String,
    pub image_url: String,
    pub item_id: String,

    pub seller_name: String,
    pub seller_rating_count: u32,
    pub seller_feedback_percentage: f32,

    pub format: ListingFormat,
    pub location: String,
    pub title: String,
    pub condition: String,
    pub price: Decimal,
    pub currency: String,
    pub postage: Decimal,
    pub can_make_offer: bool,
    pub returns: String,

    pub scraped_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(url: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            image_url: String::new(),
            item_id: String::new(),
            seller_name: String::new(),
            seller_rating_count: 0,
            seller_feedback_percentage: 0.0,
            format: ListingFormat::default(),
            location: String::new(),
            title: String::new(),
            condition: String::new(),
            price: Decimal::ZERO,
            currency: currency.into(),
            postage: Decimal::ZERO,
            can_make_offer: false,
            returns: String::new(),
            scraped_at: Utc::now(),
        }
    }
}

/// Strip the query string and fragment from a listing URL.
///
/// Tracking parameters differ between result pages, so two links to the same
/// item only compare equal once canonicalized.
pub fn canonicalize_url(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_strips_query() {
        assert_eq!(
            canonicalize_url("https://www.ebay.com/itm/111?hash=abc"),
            canonicalize_url("https://www.ebay.com/itm/111?hash=xyz"),
        );
        assert_eq!(
            canonicalize_url("https://www.ebay.com/itm/111?hash=abc"),
            "https://www.ebay.com/itm/111"
        );
    }

    #[test]
    fn test_canonicalize_strips_fragment() {
        assert_eq!(
            canonicalize_url("https://www.ebay.com/itm/111#shipping"),
            "https://www.ebay.com/itm/111"
        );
    }

    #[test]
    fn test_canonicalize_relative_url_falls_back_to_split() {
        assert_eq!(canonicalize_url("/itm/222?var=1"), "/itm/222");
    }

    #[test]
    fn test_format_serialization() {
        assert_eq!(serde_json::to_string(&ListingFormat::Auction).unwrap(), "\"auction\"");
        assert_eq!(serde_json::to_string(&ListingFormat::BuyItNow).unwrap(), "\"buy-it-now\"");
        assert_eq!(ListingFormat::default(), ListingFormat::BuyItNow);
    }

    #[test]
    fn test_listing_serializes_camel_case() {
        let listing = Listing::new("https://www.ebay.com/itm/111", "USD");
        let value = serde_json::to_value(&listing).unwrap();

        assert_eq!(value["url"], "https://www.ebay.com/itm/111");
        assert_eq!(value["currency"], "USD");
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("canMakeOffer").is_some());
        assert_eq!(value["format"], "buy-it-now");
    }
}
