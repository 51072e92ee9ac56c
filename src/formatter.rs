use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::Listing;
use crate::utils::error::{AppError, Result};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

pub const DEFAULT_TEMPLATE: &str = "{{title}} - {{price}} {{currency}} ({{format}})\r\n{{url}}\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    Url,
    ImageUrl,
    ItemId,
    SellerName,
    SellerRatingCount,
    SellerFeedbackPercentage,
    Format,
    Location,
    Title,
    Condition,
    Price,
    Currency,
    Postage,
    CanMakeOffer,
    Returns,
    ScrapedAt,
}

impl FromStr for ListingField {
    type Err = AppError;

    /// Field names are matched case-insensitively with underscores ignored,
    /// so `seller_name`, `sellerName` and `SellerName` are equivalent.
    fn from_str(name: &str) -> Result<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let field = match key.as_str() {
            "url" => ListingField::Url,
            "imageurl" => ListingField::ImageUrl,
            "itemid" | "itemnumber" | "ebayitemnumber" => ListingField::ItemId,
            "sellername" => ListingField::SellerName,
            "sellerratingcount" | "sellerstars" => ListingField::SellerRatingCount,
            "sellerfeedbackpercentage" => ListingField::SellerFeedbackPercentage,
            "format" => ListingField::Format,
            "location" => ListingField::Location,
            "title" => ListingField::Title,
            "condition" => ListingField::Condition,
            "price" => ListingField::Price,
            "currency" => ListingField::Currency,
            "postage" => ListingField::Postage,
            "canmakeoffer" => ListingField::CanMakeOffer,
            "returns" => ListingField::Returns,
            "scrapedat" => ListingField::ScrapedAt,
            _ => return Err(AppError::Template(format!("unknown listing field '{}'", name))),
        };
        Ok(field)
    }
}

impl ListingField {
    fn render(self, listing: &Listing) -> String {
        match self {
            ListingField::Url => listing.url.clone(),
            ListingField::ImageUrl => listing.image_url.clone(),
            ListingField::ItemId => listing.item_id.clone(),
            ListingField::SellerName => listing.seller_name.clone(),
            ListingField::SellerRatingCount => listing.seller_rating_count.to_string(),
            ListingField::SellerFeedbackPercentage => listing.seller_feedback_percentage.to_string(),
            ListingField::Format => listing.format.to_string(),
            ListingField::Location => listing.location.clone(),
            ListingField::Title => listing.title.clone(),
            ListingField::Condition => listing.condition.clone(),
            ListingField::Price => listing.price.to_string(),
            ListingField::Currency => listing.currency.clone(),
            ListingField::Postage => listing.postage.to_string(),
            ListingField::CanMakeOffer => listing.can_make_offer.to_string(),
            ListingField::Returns => listing.returns.clone(),
            ListingField::ScrapedAt => listing.scraped_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(ListingField),
}

/// A message template with `{{ field }}` substitution points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut last = 0;

        for captures in PLACEHOLDER.captures_iter(source) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            push_literal(&mut segments, &source[last..whole.start()])?;
            segments.push(Segment::Field(name.as_str().parse()?));
            last = whole.end();
        }
        push_literal(&mut segments, &source[last..])?;

        Ok(Self { segments })
    }

    pub fn render(&self, listing: &Listing) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Field(field) => field.render(listing),
            })
            .collect()
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) -> Result<()> {
    if text.contains("{{") {
        return Err(AppError::Template(format!("malformed placeholder near '{}'", text.trim())));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

/// Renders listings into notification messages.
///
/// Without a usable template every listing is rendered as its bare URL, so a
/// bad template never blocks notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationFormatter {
    template: Option<MessageTemplate>,
}

impl NotificationFormatter {
    pub fn new(template: MessageTemplate) -> Self {
        Self {
            template: Some(template),
        }
    }

    /// Parse `source`, logging and falling back to URL-only messages when it
    /// is invalid.
    pub fn from_source(source: &str) -> Self {
        match MessageTemplate::parse(source) {
            Ok(template) => Self::new(template),
            Err(e) => {
                tracing::warn!("Could not parse message template: {}", e);
                Self::default()
            }
        }
    }

    pub fn format(&self, listing: &Listing) -> String {
        match &self.template {
            Some(template) => template.render(listing),
            None => listing.url.clone(),
        }
    }
}
