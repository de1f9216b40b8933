//! Snapshot reconciliation.
//!
//! Pure functions: no I/O, no timing. The caller persists the next state
//! after the events have been handled.

use crate::events::{NewShopOffer, TeamEvent};
use klaval_core::TeamRole;
use klaval_scraper::{ShopSnapshot, TeamSnapshot};
use klaval_store::CachedTeamState;
use std::collections::{BTreeSet, HashSet};

/// Compare a freshly extracted team against its cached roster.
///
/// Events come out as joins (roster order), then departures (cached order),
/// then promotions (roster order). A missing cache counts as an empty team.
/// Only Regular to Agent is a promotion; demotions and any change involving
/// the Leader role produce no event.
#[must_use]
pub fn diff_team(current: &TeamSnapshot, cached: Option<&CachedTeamState>) -> Vec<TeamEvent> {
    let empty = CachedTeamState::default();
    let cached = cached.unwrap_or(&empty);
    let current_ids: HashSet<_> = current.members.iter().map(|m| &m.id).collect();

    let joined = current
        .members
        .iter()
        .filter(|m| !cached.contains(&m.id))
        .map(|m| TeamEvent::MemberJoined {
            identity: m.clone(),
        });

    let left = cached
        .members
        .iter()
        .filter(|m| !current_ids.contains(&m.id))
        .map(|m| TeamEvent::MemberLeft {
            id: m.id.clone(),
            identity: None,
        });

    let promoted = current
        .roles()
        .into_iter()
        .filter(|(member, role)| {
            *role == TeamRole::Agent && cached.role_of(&member.id) == Some(TeamRole::Regular)
        })
        .map(|(member, _)| TeamEvent::Promoted {
            identity: member.clone(),
        });

    joined.chain(left).chain(promoted).collect()
}

/// The cached roster that mirrors `current`.
#[must_use]
pub fn cached_state_of(current: &TeamSnapshot) -> CachedTeamState {
    CachedTeamState::from_roles(
        current
            .roles()
            .into_iter()
            .map(|(member, role)| (member.id.clone(), role)),
    )
}

/// Offers whose name is not in `seen`, each name reported once.
#[must_use]
pub fn novel_offers(current: &ShopSnapshot, seen: &BTreeSet<String>) -> Vec<NewShopOffer> {
    let mut reported = HashSet::new();
    current
        .offers()
        .filter(|(_, offer)| !seen.contains(&offer.name) && reported.insert(offer.name.clone()))
        .map(|(section, offer)| NewShopOffer {
            section,
            offer: offer.clone(),
        })
        .collect()
}

/// The offer-name set to persist after `current` was handled.
#[must_use]
pub fn next_offer_set(current: &ShopSnapshot) -> BTreeSet<String> {
    current.offer_names()
}
