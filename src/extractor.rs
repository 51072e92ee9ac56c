use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

use crate::document::QueryableDocument;
use crate::models::{Listing, ListingFormat};
use crate::price::parse_price;
use crate::utils::error::{AppError, Result};

const IMAGE_SELECTOR: &str = "div.ux-image-carousel-item img";
const SELLER_SELECTOR: &str = "div.x-sellercard-atf__info__about-seller a span.ux-textspans";
const PRICE_SELECTOR: &str = "div.x-price-primary span.ux-textspans";
const TITLE_SELECTOR: &str = "h1.x-item-title__mainTitle span.ux-textspans";
const BID_ACTION_SELECTOR: &str = ".x-bid-action";
const CONDITION_SELECTOR: &str = "div.x-item-condition-text span.ux-textspans";
const MAKE_OFFER_SELECTOR: &str = "#boBtn_btn";
const POSTAGE_SELECTOR: &str = "div.ux-labels-values--shipping span.ux-textspans--BOLD";

static ITEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/itm/(?:[^/]+/)?(\d+)").expect("item id pattern is valid"));

/// Turns a fetched item page into a [`Listing`].
///
/// Only the image and the price are required. Seller, title and the other
/// descriptive fields degrade to their defaults when the page layout does not
/// provide them.
#[derive(Debug, Clone, Default)]
pub struct ListingExtractor;

impl ListingExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, url: &str, currency: &str, doc: &dyn QueryableDocument) -> Result<Listing> {
        let mut listing = Listing::new(url, currency);

        listing.image_url = doc
            .find_first(IMAGE_SELECTOR)
            .and_then(|img| img.attr("src").map(str::to_string))
            .ok_or_else(|| AppError::Extraction("missing image".to_string()))?;

        listing.seller_name = text_or_empty(doc, SELLER_SELECTOR);

        listing.price = parse_price(&text_or_empty(doc, PRICE_SELECTOR))
            .map_err(|e| AppError::parse(format!("could not determine price: {}", e)))?;

        listing.format = if doc.exists(BID_ACTION_SELECTOR) {
            ListingFormat::Auction
        } else {
            ListingFormat::BuyItNow
        };

        listing.title = text_or_empty(doc, TITLE_SELECTOR);
        listing.item_id = item_id_from_url(url).unwrap_or_default();
        listing.condition = text_or_empty(doc, CONDITION_SELECTOR);
        listing.can_make_offer = doc.exists(MAKE_OFFER_SELECTOR);
        listing.postage = parse_price(&text_or_empty(doc, POSTAGE_SELECTOR)).unwrap_or(Decimal::ZERO);

        Ok(listing)
    }
}

fn text_or_empty(doc: &dyn QueryableDocument, selector: &str) -> String {
    doc.find_first(selector)
        .map(|node| node.text().to_string())
        .unwrap_or_default()
}

/// Item number embedded in a listing URL, e.g. `/itm/123456789012` or
/// `/itm/some-title/123456789012`.
pub fn item_id_from_url(url: &str) -> Option<String> {
    ITEM_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
