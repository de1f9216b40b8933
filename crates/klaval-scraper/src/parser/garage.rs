use super::{css, display_name, own_text, parse_number, percentage, text_of};
use crate::error::{Result, ScrapeError};
use crate::records::{CarCatalog, CarStats, Garage};
use klaval_core::RacerId;
use scraper::Html;
use tracing::{debug, warn};

const ENTITY: &str = "garage";

/// Number of `td.text-end` cells in the selected car's stats row.
const STAT_CELLS: usize = 7;

/// Extract a racer's garage, resolving car names against `catalog`.
///
/// Owned cars whose name is not in the catalog are dropped. A missing stats
/// table yields zero stats for the selected car.
pub fn parse_garage(html: &str, racer_id: &RacerId, catalog: &CarCatalog) -> Result<Garage> {
    let document = Html::parse_document(html);
    let display_name = display_name(&document, ENTITY)?;

    let car_links = css(r#"a[data-turbo-frame="selected_car"]"#)?;
    let mut cars = Vec::new();
    for link in document.select(&car_links) {
        let Some(title) = link.value().attr("title") else {
            continue;
        };
        let name = title.split('|').next().unwrap_or_default().trim();
        match catalog.get(name) {
            Some(car) if !cars.contains(car) => cars.push(car.clone()),
            Some(_) => {}
            None => warn!(racer = %racer_id, car = name, "owned car not in catalog, dropped"),
        }
    }

    let header = css("div#selected_car div.card-header")?;
    let selected_car = document
        .select(&header)
        .next()
        .map(own_text)
        .and_then(|name| {
            let car = catalog.get(&name).cloned();
            if car.is_none() {
                warn!(racer = %racer_id, car = %name, "selected car not in catalog");
            }
            car
        });

    let selected_stats = parse_car_stats(&document)?;

    debug!(racer = %racer_id, cars = cars.len(), "parsed garage");
    Ok(Garage {
        racer_id: racer_id.clone(),
        display_name,
        cars,
        selected_car,
        selected_stats,
    })
}

fn parse_car_stats(document: &Html) -> Result<CarStats> {
    let scoped = css("div#selected_car tbody")?;
    let any = css("tbody")?;
    let table = document
        .select(&scoped)
        .next()
        .or_else(|| document.select(&any).next());
    let Some(table) = table else {
        return Ok(CarStats::default());
    };

    let cell = css("td.text-end")?;
    let values: Vec<String> = table.select(&cell).map(text_of).collect();
    let Some([races, dqs, avg_wpm, avg_acc, top_wpm, top_acc, perfect]) = values.get(..STAT_CELLS)
    else {
        return Err(ScrapeError::extraction(
            ENTITY,
            "selected_stats",
            format!("expected at least {STAT_CELLS} stat cells, found {}", values.len()),
        ));
    };

    Ok(CarStats {
        races: parse_number(ENTITY, "races", races)?,
        disqualifications: parse_number(ENTITY, "disqualifications", dqs)?,
        avg_wpm: parse_number(ENTITY, "avg_wpm", avg_wpm)?,
        avg_accuracy: percentage(ENTITY, "avg_accuracy", parse_number(ENTITY, "avg_accuracy", avg_acc)?)?,
        top_wpm: parse_number(ENTITY, "top_wpm", top_wpm)?,
        top_accuracy: percentage(ENTITY, "top_accuracy", parse_number(ENTITY, "top_accuracy", top_acc)?)?,
        perfect_races: parse_number(ENTITY, "perfect_races", perfect)?,
    })
}
