use crate::error::{Result, ScrapeError};
use crate::records::ShopSection;
use klaval_core::{RacerId, TeamTag};
use url::Url;

/// The page templates of the racing site, resolved against one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    base: Url,
}

impl SiteUrls {
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn page(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| ScrapeError::InvalidUrl(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Racer profile, which also carries the headline stats.
    pub fn racer_profile(&self, id: &RacerId) -> Result<Url> {
        self.page(&["racers", id.as_str()])
    }

    pub fn garage(&self, id: &RacerId) -> Result<Url> {
        self.page(&["racers", id.as_str(), "garage"])
    }

    pub fn quests(&self, id: &RacerId) -> Result<Url> {
        self.page(&["racers", id.as_str(), "quests"])
    }

    pub fn car_catalog(&self) -> Result<Url> {
        self.page(&["leaderboards", "cars"])
    }

    pub fn team(&self, tag: &TeamTag) -> Result<Url> {
        self.page(&["teams", tag.as_str()])
    }

    pub fn shop_section(&self, section: ShopSection) -> Result<Url> {
        let slug = match section {
            ShopSection::Seasonal => "season-shop",
            ShopSection::AlicesDeals => "alices-deals",
        };
        self.page(&["shops", slug])
    }

    /// JSON racer search; the query is form-encoded.
    pub fn racer_search(&self, query: &str) -> Result<Url> {
        let mut url = self.page(&["racers", "autocomplete_with_garage"])?;
        url.query_pairs_mut().append_pair("query", query);
        Ok(url)
    }

    /// Resolve a possibly relative asset reference against the site origin.
    #[must_use]
    pub fn absolute(&self, reference: &str) -> String {
        self.base
            .join(reference.trim())
            .map_or_else(|_| reference.trim().to_string(), String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> SiteUrls {
        SiteUrls::new(Url::parse("https://klavia.io/").expect("valid base"))
    }

    #[test]
    fn test_page_templates() {
        let urls = urls();
        let id = RacerId::new("62812").expect("valid id");
        let tag = TeamTag::new("vyn").expect("valid tag");

        assert_eq!(
            urls.racer_profile(&id).expect("url").as_str(),
            "https://klavia.io/racers/62812"
        );
        assert_eq!(
            urls.garage(&id).expect("url").as_str(),
            "https://klavia.io/racers/62812/garage"
        );
        assert_eq!(
            urls.quests(&id).expect("url").as_str(),
            "https://klavia.io/racers/62812/quests"
        );
        assert_eq!(
            urls.team(&tag).expect("url").as_str(),
            "https://klavia.io/teams/VYN"
        );
        assert_eq!(
            urls.car_catalog().expect("url").as_str(),
            "https://klavia.io/leaderboards/cars"
        );
        assert_eq!(
            urls.shop_section(ShopSection::AlicesDeals)
                .expect("url")
                .as_str(),
            "https://klavia.io/shops/alices-deals"
        );
    }

    #[test]
    fn test_search_query_is_encoded() {
        let url = urls().racer_search("speedy racer&co").expect("url");
        assert_eq!(
            url.as_str(),
            "https://klavia.io/racers/autocomplete_with_garage?query=speedy+racer%26co"
        );
    }

    #[test]
    fn test_nested_base_keeps_prefix() {
        let urls = SiteUrls::new(Url::parse("http://localhost:8080/mirror/").expect("valid base"));
        assert_eq!(
            urls.car_catalog().expect("url").as_str(),
            "http://localhost:8080/mirror/leaderboards/cars"
        );
    }

    #[test]
    fn test_absolute_asset_urls() {
        let urls = urls();
        assert_eq!(
            urls.absolute("/assets/cars/falcon.png"),
            "https://klavia.io/assets/cars/falcon.png"
        );
        assert_eq!(
            urls.absolute("https://cdn.klavia.io/falcon.png"),
            "https://cdn.klavia.io/falcon.png"
        );
    }
}
