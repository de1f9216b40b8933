use super::css;
use crate::error::Result;
use crate::records::{Car, CarCatalog};
use crate::url_builder::SiteUrls;
use scraper::Html;
use tracing::debug;

/// Extract the canonical car list from the car leaderboard.
///
/// Every table row holding an image with a `title` is one car; header rows
/// and rows without a titled image are skipped.
pub fn parse_car_catalog(html: &str, urls: &SiteUrls) -> Result<CarCatalog> {
    let document = Html::parse_document(html);
    let rows = css("tr")?;
    let image = css("img[title]")?;

    let cars = document.select(&rows).filter_map(|row| {
        let img = row.select(&image).next()?;
        let name = img.value().attr("title")?.trim();
        if name.is_empty() {
            return None;
        }
        Some(Car {
            name: name.to_string(),
            image_url: img
                .value()
                .attr("src")
                .map(|src| urls.absolute(src))
                .unwrap_or_default(),
        })
    });

    let catalog = CarCatalog::new(cars);
    debug!(cars = catalog.len(), "parsed car catalog");
    Ok(catalog)
}
