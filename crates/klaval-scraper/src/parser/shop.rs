use super::{css, parse_number, text_of};
use crate::error::{Result, ScrapeError};
use crate::records::ShopOffer;
use crate::url_builder::SiteUrls;
use scraper::Html;

const ENTITY: &str = "shop_offer";

/// Extract the ordered offers of one shop section.
///
/// The offer grid is required: a page without it (sign-in redirect,
/// maintenance, markup drift) is an error, not an empty shop. Within an
/// offer, name and price are required; a missing image leaves `image_url`
/// empty.
pub fn parse_shop_section(html: &str, urls: &SiteUrls) -> Result<Vec<ShopOffer>> {
    let document = Html::parse_document(html);

    let grid = css("div.row.g-3")?;
    let grid = document
        .select(&grid)
        .next()
        .ok_or_else(|| ScrapeError::extraction(ENTITY, "grid", "no offer grid on shop page"))?;

    let item = css("div.col-lg-6")?;
    let heading = css("h4")?;
    let price = css("strong")?;
    let image = css("div.mb-3 img[src]")?;

    grid.select(&item)
        .map(|offer| {
            let name = offer
                .select(&heading)
                .next()
                .map(text_of)
                .and_then(|text| {
                    text.lines()
                        .map(str::trim)
                        .find(|line| !line.is_empty())
                        .map(ToString::to_string)
                })
                .ok_or_else(|| ScrapeError::extraction(ENTITY, "name", "offer without h4 title"))?;

            let raw_price = offer
                .select(&price)
                .next()
                .map(text_of)
                .ok_or_else(|| ScrapeError::extraction(ENTITY, "price", format!("no price for '{name}'")))?;

            let image_url = offer
                .select(&image)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(|src| urls.absolute(src))
                .unwrap_or_default();

            Ok(ShopOffer {
                price: parse_number(ENTITY, "price", &raw_price)?,
                name,
                image_url,
            })
        })
        .collect()
}
