//! Typed records produced by the extractors.
//!
//! Records are built fresh on every extraction and never mutated afterwards.

use klaval_core::{RacerId, TeamRole, TeamTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Who a racer is. `id` is the only reliable join key across entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RacerIdentity {
    pub id: RacerId,
    pub display_name: String,
    pub username: String,
}

impl RacerIdentity {
    /// Identity for an id the racer search could not resolve.
    ///
    /// Both names fall back to the id itself.
    #[must_use]
    pub fn unresolved(id: RacerId) -> Self {
        Self {
            display_name: id.to_string(),
            username: id.to_string(),
            id,
        }
    }
}

/// One roster row before identities are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: RacerId,
    pub role: TeamRole,
}

/// A team page reduced to its header and roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRoster {
    pub name: String,
    pub entries: Vec<RosterEntry>,
}

/// A team as currently shown on the site.
///
/// `members` holds every racer in roster order; `leader` and `agents` are
/// subsets of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub tag: TeamTag,
    pub name: String,
    pub leader: Option<RacerIdentity>,
    pub agents: Vec<RacerIdentity>,
    pub members: Vec<RacerIdentity>,
}

impl TeamSnapshot {
    /// Role of a member, `None` if the racer is not on the team.
    #[must_use]
    pub fn role_of(&self, id: &RacerId) -> Option<TeamRole> {
        if !self.members.iter().any(|m| &m.id == id) {
            return None;
        }
        if self.leader.as_ref().is_some_and(|l| &l.id == id) {
            Some(TeamRole::Leader)
        } else if self.agents.iter().any(|a| &a.id == id) {
            Some(TeamRole::Agent)
        } else {
            Some(TeamRole::Regular)
        }
    }

    /// Every member with their role, in roster order.
    #[must_use]
    pub fn roles(&self) -> Vec<(&RacerIdentity, TeamRole)> {
        self.members
            .iter()
            .map(|m| (m, self.role_of(&m.id).unwrap_or(TeamRole::Regular)))
            .collect()
    }

    #[must_use]
    pub fn member(&self, id: &RacerId) -> Option<&RacerIdentity> {
        self.members.iter().find(|m| &m.id == id)
    }
}

/// A car model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Car {
    pub name: String,
    pub image_url: String,
}

/// Canonical list of every car model, in leaderboard order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarCatalog {
    cars: Vec<Car>,
}

impl CarCatalog {
    /// Build a catalog; later duplicates of a name are ignored.
    #[must_use]
    pub fn new(cars: impl IntoIterator<Item = Car>) -> Self {
        let mut seen = BTreeSet::new();
        let cars = cars
            .into_iter()
            .filter(|car| seen.insert(car.name.clone()))
            .collect();
        Self { cars }
    }

    /// Look up a car by its display name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Car> {
        self.cars.iter().find(|car| car.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Car> {
        self.cars.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }
}

/// Per-car race statistics. Accuracies are percentages in `0..=100`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarStats {
    pub races: u64,
    pub disqualifications: u64,
    pub avg_wpm: f64,
    pub avg_accuracy: f64,
    pub top_wpm: f64,
    pub top_accuracy: f64,
    pub perfect_races: u64,
}

/// Cars a racer owns and the one currently selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garage {
    pub racer_id: RacerId,
    pub display_name: String,
    pub cars: Vec<Car>,
    pub selected_car: Option<Car>,
    pub selected_stats: CarStats,
}

/// Headline statistics of a racer. All zero for a racer who was never ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatOverview {
    pub lifetime_races: u64,
    pub longest_session: u64,
    pub top_wpm: f64,
    pub current_wpm: f64,
    pub perfect_races: u64,
    pub current_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub racer_id: RacerId,
    pub display_name: String,
    pub overview: UserStatOverview,
}

/// Progress on one quest, as an integer percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub name: String,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuests {
    pub racer_id: RacerId,
    pub display_name: String,
    pub quests: Vec<QuestProgress>,
}

/// One purchasable item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopOffer {
    pub name: String,
    pub price: u64,
    pub image_url: String,
}

/// The two sections of the in-game shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopSection {
    Seasonal,
    AlicesDeals,
}

impl ShopSection {
    pub const ALL: [Self; 2] = [Self::Seasonal, Self::AlicesDeals];
}

impl fmt::Display for ShopSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Seasonal => "Season Shop",
            Self::AlicesDeals => "Alice's Deals",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub seasonal_offers: Vec<ShopOffer>,
    pub alices_deals: Vec<ShopOffer>,
}

impl ShopSnapshot {
    #[must_use]
    pub fn section(&self, section: ShopSection) -> &[ShopOffer] {
        match section {
            ShopSection::Seasonal => &self.seasonal_offers,
            ShopSection::AlicesDeals => &self.alices_deals,
        }
    }

    /// Every offer tagged with its section, seasonal offers first.
    pub fn offers(&self) -> impl Iterator<Item = (ShopSection, &ShopOffer)> {
        ShopSection::ALL
            .into_iter()
            .flat_map(move |section| self.section(section).iter().map(move |o| (section, o)))
    }

    /// Names of all offers across both sections.
    #[must_use]
    pub fn offer_names(&self) -> BTreeSet<String> {
        self.offers().map(|(_, offer)| offer.name.clone()).collect()
    }
}
