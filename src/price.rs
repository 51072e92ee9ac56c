use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::utils::error::{AppError, Result};

static NUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9.]+").expect("numeric run pattern is valid"));

/// Parse localized price text such as `"$1,234.56 USD"` or `"EUR 12,50"` into
/// a decimal amount.
///
/// When both separators appear, the one occurring last is the decimal
/// separator. A lone comma is treated as the decimal separator. The first run
/// of digits and dots after normalization is the amount; everything else
/// (currency symbols, unit text) is ignored.
pub fn parse_price(raw: &str) -> Result<Decimal> {
    let normalized = normalize_separators(raw);

    let numeric = NUMERIC_RUN
        .find(&normalized)
        .map(|m| m.as_str())
        .unwrap_or_default();

    if !numeric.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::parse(format!("no digits in price text '{}'", raw)));
    }

    Decimal::from_str(numeric)
        .map_err(|e| AppError::parse(format!("could not convert '{}' to a decimal: {}", numeric, e)))
}

fn normalize_separators(raw: &str) -> String {
    match (raw.rfind(','), raw.rfind('.')) {
        // "1.234,56" style, comma is the decimal separator
        (Some(comma), Some(dot)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), None) => raw.replace(',', "."),
        // "1,234.56" style, or no comma at all
        _ => raw.replace(',', ""),
    }
}
