//! Klaval Scraper - typed extraction from the racing site's pages.
//!
//! Turns rendered, version-drifting markup into typed records: team rosters,
//! racer stats, garages, quests, the car catalog and the shop. Every entity
//! has its own extractor; optional fields fall back to documented defaults
//! while malformed required fields surface as extraction errors naming the
//! entity and field.
//!
//! # Example
//!
//! ```rust,ignore
//! use klaval_scraper::Crawler;
//!
//! let crawler = Crawler::new(session, provider.base_url().clone());
//! let team = crawler.team(&TeamTag::new("vyn")?).await?;
//! let shop = crawler.shop().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod crawler;
#[allow(missing_docs)]
pub mod error;
pub mod parser;
pub mod ranker;
#[allow(missing_docs)]
pub mod records;
#[allow(missing_docs)]
pub mod url_builder;

// Re-export commonly used types
pub use crawler::{Crawler, MAX_SEARCH_RESULTS};
pub use error::{Result, ScrapeError};
pub use ranker::{rank, similarity};
pub use records::{
    Car, CarCatalog, CarStats, Garage, QuestProgress, RacerIdentity, RosterEntry, ShopOffer,
    ShopSection, ShopSnapshot, TeamRoster, TeamSnapshot, UserQuests, UserStatOverview, UserStats,
};
pub use url_builder::SiteUrls;
