use super::{css, display_name, parse_number, parse_optional, percentage, text_of};
use crate::error::Result;
use crate::records::{UserStatOverview, UserStats};
use klaval_core::RacerId;
use scraper::{ElementRef, Html};
use tracing::debug;

const ENTITY: &str = "stats";

/// Extract a racer's headline stats from their profile page.
///
/// The three header counters (lifetime races, top speed, perfect races) are
/// rendered as `strong` elements and only exist once the racer has been
/// ranked; without them the whole overview is zero. The minor stats live in
/// label/value table cells and default to zero when their label is missing.
pub fn parse_stats(html: &str, racer_id: &RacerId) -> Result<UserStats> {
    let document = Html::parse_document(html);
    let display_name = display_name(&document, ENTITY)?;

    let strong = css("strong")?;
    let counters: Vec<String> = document.select(&strong).map(text_of).collect();

    let overview = if let [lifetime, top_wpm, perfect, ..] = counters.as_slice() {
        UserStatOverview {
            lifetime_races: parse_number(ENTITY, "lifetime_races", lifetime)?,
            top_wpm: parse_number(ENTITY, "top_wpm", top_wpm)?,
            perfect_races: parse_number(ENTITY, "perfect_races", perfect)?,
            longest_session: parse_optional(
                ENTITY,
                "longest_session",
                labeled_value(&document, "Longest Session")?.as_deref(),
            )?,
            current_wpm: parse_optional(
                ENTITY,
                "current_wpm",
                labeled_value(&document, "Current Speed")?.as_deref(),
            )?,
            current_accuracy: percentage(
                ENTITY,
                "current_accuracy",
                parse_optional(
                    ENTITY,
                    "current_accuracy",
                    labeled_value(&document, "Current Accuracy")?.as_deref(),
                )?,
            )?,
        }
    } else {
        debug!(racer = %racer_id, "no ranked counters on profile, using zero stats");
        UserStatOverview::default()
    };

    Ok(UserStats {
        racer_id: racer_id.clone(),
        display_name,
        overview,
    })
}

/// Value cell following the cell whose text starts with `label`.
fn labeled_value(document: &Html, label: &str) -> Result<Option<String>> {
    let cells = css("td")?;

    let value = document
        .select(&cells)
        .find(|td| text_of(*td).starts_with(label))
        .and_then(|td| {
            td.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| sibling.value().name() == "td")
        })
        .map(text_of)
        .filter(|text| !text.is_empty());

    Ok(value)
}
