//! Event sink that writes every event to the log.

use klaval_scraper::TeamSnapshot;
use klaval_sync::{EventSink, NewShopOffer, SyncError, TeamEvent};
use tracing::info;

/// Logs events as structured JSON lines under the `klaval::events` target.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait::async_trait]
impl EventSink for LogSink {
    async fn team_events(
        &self,
        tracking_id: &str,
        team: &TeamSnapshot,
        events: &[TeamEvent],
    ) -> klaval_sync::Result<()> {
        for event in events {
            let payload =
                serde_json::to_string(event).map_err(|e| SyncError::Sink(e.to_string()))?;
            info!(
                target: "klaval::events",
                tracking_id,
                team = %team.tag,
                kind = ?event.kind(),
                %payload,
                "team event"
            );
        }
        Ok(())
    }

    async fn shop_offers(&self, offers: &[NewShopOffer]) -> klaval_sync::Result<()> {
        for offer in offers {
            info!(
                target: "klaval::events",
                section = %offer.section,
                name = %offer.offer.name,
                price = offer.offer.price,
                image = %offer.offer.image_url,
                "new shop offer"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klaval_core::{RacerId, TeamTag};
    use klaval_scraper::{RacerIdentity, ShopOffer, ShopSection};

    #[tokio::test]
    async fn test_log_sink_accepts_events() {
        let identity = RacerIdentity::unresolved(RacerId::new("7").expect("valid id"));
        let team = TeamSnapshot {
            tag: TeamTag::new("VYN").expect("valid tag"),
            name: "Vyn".to_string(),
            leader: None,
            agents: Vec::new(),
            members: vec![identity.clone()],
        };
        let sink = LogSink;

        sink.team_events("guild-1", &team, &[TeamEvent::MemberJoined { identity }])
            .await
            .expect("logged");
        sink.shop_offers(&[NewShopOffer {
            section: ShopSection::AlicesDeals,
            offer: ShopOffer {
                name: "Blaze".to_string(),
                price: 250,
                image_url: String::new(),
            },
        }])
        .await
        .expect("logged");
    }
}
