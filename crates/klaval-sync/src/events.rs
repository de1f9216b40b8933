//! Events handed to the consumer.

use klaval_core::{RacerId, TeamEventKind};
use klaval_scraper::{RacerIdentity, ShopOffer, ShopSection};
use serde::Serialize;

/// A discrete change in a tracked team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TeamEvent {
    /// A racer appeared on the roster.
    MemberJoined { identity: RacerIdentity },
    /// A racer disappeared from the roster.
    ///
    /// Only the id survives in the cache; `identity` is filled in by a racer
    /// search when that succeeds.
    MemberLeft {
        id: RacerId,
        identity: Option<RacerIdentity>,
    },
    /// A regular member became an agent.
    Promoted { identity: RacerIdentity },
}

impl TeamEvent {
    #[must_use]
    pub fn kind(&self) -> TeamEventKind {
        match self {
            Self::MemberJoined { .. } => TeamEventKind::NewMember,
            Self::MemberLeft { .. } => TeamEventKind::MemberLeft,
            Self::Promoted { .. } => TeamEventKind::Promotion,
        }
    }

    #[must_use]
    pub fn racer_id(&self) -> &RacerId {
        match self {
            Self::MemberJoined { identity } | Self::Promoted { identity } => &identity.id,
            Self::MemberLeft { id, .. } => id,
        }
    }
}

/// An offer whose name has not been seen before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewShopOffer {
    pub section: ShopSection,
    pub offer: ShopOffer,
}
