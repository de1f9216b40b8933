//! Extractors: one module per entity kind.
//!
//! Every extractor is a plain function from page text to a record. Pages are
//! parsed synchronously so a parsed document never lives across a fetch.
//!
//! Fields are resolved independently. Optional fields that are absent fall
//! back to a documented default; a field that is present but malformed is an
//! [`ScrapeError::Extraction`] naming the entity and field.

mod catalog;
mod garage;
mod quests;
mod search;
mod shop;
mod stats;
mod team;

pub use catalog::parse_car_catalog;
pub use garage::parse_garage;
pub use quests::parse_quests;
pub use search::parse_search_results;
pub use shop::parse_shop_section;
pub use stats::parse_stats;
pub use team::parse_team_roster;

use crate::error::{Result, ScrapeError};
use scraper::{ElementRef, Html, Node, Selector};
use std::str::FromStr;

pub(crate) fn css(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// All text below `element`, whitespace-trimmed.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text nodes directly inside `element`, ignoring nested tags.
pub(crate) fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text of the first match of `selector`, if any non-empty one exists.
pub(crate) fn first_text(document: &Html, selector: &str) -> Result<Option<String>> {
    let selector = css(selector)?;
    Ok(document
        .select(&selector)
        .map(text_of)
        .find(|text| !text.is_empty()))
}

/// Display name from the page's `h3` header.
pub(crate) fn display_name(document: &Html, entity: &'static str) -> Result<String> {
    first_text(document, "h3")?
        .ok_or_else(|| ScrapeError::extraction(entity, "display_name", "no h3 header on page"))
}

/// Reduce a rendered number to its digits: keeps the first word and strips
/// thousands separators and a trailing `%`.
///
/// `"12,345 races"` becomes `"12345"`, `"97.5%"` becomes `"97.5"`.
pub(crate) fn numeric_text(raw: &str) -> String {
    raw.split_whitespace()
        .next()
        .unwrap_or_default()
        .replace(',', "")
        .trim_end_matches('%')
        .to_string()
}

/// Parse a field that must be present.
pub(crate) fn parse_number<T>(entity: &'static str, field: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let cleaned = numeric_text(raw);
    cleaned.parse::<T>().map_err(|e| {
        ScrapeError::extraction(entity, field, format!("cannot parse '{}': {e}", raw.trim()))
    })
}

/// Parse a field that may be absent; absence yields `T::default()`.
pub(crate) fn parse_optional<T>(
    entity: &'static str,
    field: &'static str,
    raw: Option<&str>,
) -> Result<T>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    raw.map_or_else(|| Ok(T::default()), |raw| parse_number(entity, field, raw))
}

/// Check a percentage lies in `0..=100`.
pub(crate) fn percentage(entity: &'static str, field: &'static str, value: f64) -> Result<f64> {
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(ScrapeError::extraction(
            entity,
            field,
            format!("{value} is outside 0-100%"),
        ))
    }
}
