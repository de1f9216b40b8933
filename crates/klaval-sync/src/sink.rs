//! The consumer boundary.
//!
//! The core's contract ends at handing over typed events. Formatting,
//! delivery and delivery pacing belong to the sink.

use crate::error::Result;
use crate::events::{NewShopOffer, TeamEvent};
use klaval_scraper::TeamSnapshot;

/// Receives the events of one poll cycle.
///
/// A returned error means the events were not delivered; the cycle then
/// keeps the previous snapshot so the same events are computed again next
/// cycle.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Events for one tracked team, in delivery order. Never empty.
    async fn team_events(
        &self,
        tracking_id: &str,
        team: &TeamSnapshot,
        events: &[TeamEvent],
    ) -> Result<()>;

    /// Offers that appeared in the shop. Never empty.
    async fn shop_offers(&self, offers: &[NewShopOffer]) -> Result<()>;
}
