//! Fetch-and-extract facade over a [`PageSource`].

use crate::error::Result;
use crate::parser;
use crate::ranker;
use crate::records::{
    CarCatalog, Garage, RacerIdentity, ShopOffer, ShopSection, ShopSnapshot, TeamRoster,
    TeamSnapshot, UserQuests, UserStats,
};
use crate::url_builder::SiteUrls;
use klaval_core::{RacerId, TeamRole, TeamTag};
use klaval_session::PageSource;
use tracing::{debug, info, warn};
use url::Url;

/// Upper bound for search results handed to selection lists.
pub const MAX_SEARCH_RESULTS: usize = 25;

/// Extracts typed records from the site through one page source.
///
/// Requests are issued one at a time; a crawler should own its session.
pub struct Crawler<S> {
    source: S,
    urls: SiteUrls,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(source: S, base_url: Url) -> Self {
        Self {
            source,
            urls: SiteUrls::new(base_url),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn urls(&self) -> &SiteUrls {
        &self.urls
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching page");
        Ok(self.source.fetch_text(url).await?)
    }

    /// Search racers, best username match first.
    pub async fn search_racers(&self, query: &str) -> Result<Vec<RacerIdentity>> {
        let url = self.urls.racer_search(query)?;
        let body = self.fetch(&url).await?;
        let results = parser::parse_search_results(&body, url.as_str())?;
        debug!(query, results = results.len(), "racer search");
        Ok(ranker::rank(results, query))
    }

    /// Search racers and keep at most `limit` of the best matches.
    pub async fn search_racers_limited(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RacerIdentity>> {
        let mut results = self.search_racers(query).await?;
        results.truncate(limit.min(MAX_SEARCH_RESULTS));
        Ok(results)
    }

    /// Top search result for `query`, if any.
    pub async fn search_racer(&self, query: &str) -> Result<Option<RacerIdentity>> {
        Ok(self.search_racers(query).await?.into_iter().next())
    }

    /// Full identity for a racer id.
    ///
    /// Only a search result carrying exactly this id is accepted; otherwise
    /// the id itself stands in for the names.
    pub async fn resolve_racer(&self, id: &RacerId) -> Result<RacerIdentity> {
        let results = self.search_racers(id.as_str()).await?;
        match results.into_iter().find(|r| &r.id == id) {
            Some(identity) => Ok(identity),
            None => {
                warn!(racer = %id, "racer search has no exact match, keeping id as name");
                Ok(RacerIdentity::unresolved(id.clone()))
            }
        }
    }

    /// Current team roster with resolved identities.
    pub async fn team(&self, tag: &TeamTag) -> Result<TeamSnapshot> {
        let url = self.urls.team(tag)?;
        let body = self.fetch(&url).await?;
        let roster = parser::parse_team_roster(&body)?;
        self.resolve_roster(tag, roster).await
    }

    async fn resolve_roster(&self, tag: &TeamTag, roster: TeamRoster) -> Result<TeamSnapshot> {
        let mut leader = None;
        let mut agents = Vec::new();
        let mut members = Vec::with_capacity(roster.entries.len());

        for entry in roster.entries {
            let identity = self.resolve_racer(&entry.id).await?;
            match entry.role {
                TeamRole::Leader => leader = Some(identity.clone()),
                TeamRole::Agent => agents.push(identity.clone()),
                TeamRole::Regular => {}
            }
            members.push(identity);
        }

        info!(team = %tag, members = members.len(), "extracted team");
        Ok(TeamSnapshot {
            tag: tag.clone(),
            name: roster.name,
            leader,
            agents,
            members,
        })
    }

    pub async fn stats(&self, id: &RacerId) -> Result<UserStats> {
        let url = self.urls.racer_profile(id)?;
        let body = self.fetch(&url).await?;
        parser::parse_stats(&body, id)
    }

    /// Canonical car list from the car leaderboard.
    pub async fn car_catalog(&self) -> Result<CarCatalog> {
        let url = self.urls.car_catalog()?;
        let body = self.fetch(&url).await?;
        parser::parse_car_catalog(&body, &self.urls)
    }

    /// A racer's garage. Fetches the car catalog first.
    pub async fn garage(&self, id: &RacerId) -> Result<Garage> {
        let catalog = self.car_catalog().await?;
        let url = self.urls.garage(id)?;
        let body = self.fetch(&url).await?;
        parser::parse_garage(&body, id, &catalog)
    }

    pub async fn quests(&self, id: &RacerId) -> Result<UserQuests> {
        let url = self.urls.quests(id)?;
        let body = self.fetch(&url).await?;
        parser::parse_quests(&body, id)
    }

    pub async fn shop_section(&self, section: ShopSection) -> Result<Vec<ShopOffer>> {
        let url = self.urls.shop_section(section)?;
        let body = self.fetch(&url).await?;
        parser::parse_shop_section(&body, &self.urls)
    }

    /// Both shop sections.
    pub async fn shop(&self) -> Result<ShopSnapshot> {
        let seasonal_offers = self.shop_section(ShopSection::Seasonal).await?;
        let alices_deals = self.shop_section(ShopSection::AlicesDeals).await?;
        debug!(
            seasonal = seasonal_offers.len(),
            deals = alices_deals.len(),
            "extracted shop"
        );
        Ok(ShopSnapshot {
            seasonal_offers,
            alices_deals,
        })
    }
}
