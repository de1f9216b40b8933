//! The persisted document.
//!
//! ```json
//! {
//!   "teams": {
//!     "guild-1": {
//!       "tag": "VYN",
//!       "settings": { "notify_events": ["NewMember", "MemberLeft", "Promotion"] },
//!       "cached_state": { "members": [{ "id": "32893", "role": "Regular" }] }
//!     }
//!   },
//!   "shop_offers": ["Falcon", "Neon Trail"]
//! }
//! ```

use klaval_core::{RacerId, TeamEventKind, TeamRole, TeamTag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything that outlives a poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// Tracked teams keyed by tracking id (e.g. the community that follows them).
    pub teams: BTreeMap<String, TrackedTeam>,
    /// Names of every shop offer seen so far.
    pub shop_offers: BTreeSet<String>,
}

impl PersistedState {
    #[must_use]
    pub fn team(&self, tracking_id: &str) -> Option<&TrackedTeam> {
        self.teams.get(tracking_id)
    }
}

/// A team followed by one tracking id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTeam {
    pub tag: TeamTag,
    #[serde(default)]
    pub settings: TeamSettings,
    /// Roster as of the last completed reconciliation; `None` before the first.
    #[serde(default)]
    pub cached_state: Option<CachedTeamState>,
}

impl TrackedTeam {
    #[must_use]
    pub fn new(tag: TeamTag) -> Self {
        Self {
            tag,
            settings: TeamSettings::default(),
            cached_state: None,
        }
    }
}

/// Which events are handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSettings {
    #[serde(default = "all_events")]
    pub notify_events: BTreeSet<TeamEventKind>,
}

fn all_events() -> BTreeSet<TeamEventKind> {
    TeamEventKind::ALL.into_iter().collect()
}

impl Default for TeamSettings {
    fn default() -> Self {
        Self {
            notify_events: all_events(),
        }
    }
}

impl TeamSettings {
    #[must_use]
    pub fn notifies(&self, kind: TeamEventKind) -> bool {
        self.notify_events.contains(&kind)
    }
}

/// Persisted mirror of a team's role assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTeamState {
    pub members: Vec<CachedMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMember {
    pub id: RacerId,
    pub role: TeamRole,
}

impl CachedTeamState {
    /// Build from `(id, role)` pairs; the first occurrence of an id wins.
    pub fn from_roles(roles: impl IntoIterator<Item = (RacerId, TeamRole)>) -> Self {
        let mut seen = BTreeSet::new();
        let members = roles
            .into_iter()
            .filter(|(id, _)| seen.insert(id.clone()))
            .map(|(id, role)| CachedMember { id, role })
            .collect();
        Self { members }
    }

    #[must_use]
    pub fn role_of(&self, id: &RacerId) -> Option<TeamRole> {
        self.members.iter().find(|m| &m.id == id).map(|m| m.role)
    }

    #[must_use]
    pub fn contains(&self, id: &RacerId) -> bool {
        self.role_of(id).is_some()
    }
}
