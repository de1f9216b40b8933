//! Shared types used across the Klaval crates.
//!
//! This module defines the identifier newtypes and small enums that every
//! layer (extraction, persistence, reconciliation) agrees on.

use crate::error::KlavalError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for racer identifiers.
///
/// The site exposes racers by an opaque id (currently numeric). The id is the
/// only reliable join key between roster rows, search results and the
/// persisted team state, so it is validated to be usable as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RacerId(String);

impl RacerId {
    /// Create a new `RacerId` from a string.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns error if the id is empty, longer than 64 characters or contains
    /// whitespace or URL delimiters.
    pub fn new(id: impl Into<String>) -> Result<Self, KlavalError> {
        let id = id.into().trim().to_string();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), KlavalError> {
        static RACER_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex =
            RACER_REGEX.get_or_init(|| Regex::new(r"^[^\s/?#]{1,64}$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(KlavalError::Validation(format!(
                "invalid racer ID: must be 1-64 characters without whitespace, '/', '?' or '#', got '{id}'"
            )))
        }
    }
}

impl fmt::Display for RacerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RacerId {
    type Error = KlavalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RacerId> for String {
    fn from(id: RacerId) -> Self {
        id.0
    }
}

/// Newtype for team tags.
///
/// Tags are case-insensitive on the site; the canonical form is upper-case,
/// so `"vyn"` and `"VYN"` produce equal values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamTag(String);

impl TeamTag {
    /// Create a canonical (upper-cased) `TeamTag`.
    ///
    /// # Errors
    /// Returns error if the tag is empty, longer than 16 characters or contains
    /// whitespace or URL delimiters.
    pub fn new(tag: impl Into<String>) -> Result<Self, KlavalError> {
        let tag = tag.into().trim().to_uppercase();
        Self::validate(&tag)?;
        Ok(Self(tag))
    }

    /// Get the canonical tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(tag: &str) -> Result<(), KlavalError> {
        static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = TAG_REGEX.get_or_init(|| Regex::new(r"^[^\s/?#]{1,16}$").expect("valid regex"));

        if regex.is_match(tag) {
            Ok(())
        } else {
            Err(KlavalError::Validation(format!(
                "invalid team tag: must be 1-16 characters without whitespace, '/', '?' or '#', got '{tag}'"
            )))
        }
    }
}

impl fmt::Display for TeamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TeamTag {
    type Error = KlavalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamTag> for String {
    fn from(tag: TeamTag) -> Self {
        tag.0
    }
}

/// Role of a member inside a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamRole {
    /// Team leader (at most one per team)
    Leader,
    /// Agent (moderator-like role)
    Agent,
    /// Any other member
    Regular,
}

impl TeamRole {
    /// Classify a roster badge label.
    ///
    /// `"Leader"` and `"Agent"` map to their roles, anything else (including
    /// no badge at all) is a regular member.
    #[must_use]
    pub fn from_badge(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some(l) if l.eq_ignore_ascii_case("leader") => Self::Leader,
            Some(l) if l.eq_ignore_ascii_case("agent") => Self::Agent,
            _ => Self::Regular,
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Leader => "Leader",
            Self::Agent => "Agent",
            Self::Regular => "Regular",
        };
        f.write_str(name)
    }
}

/// Kinds of team events a tracked team can be notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TeamEventKind {
    /// A racer joined the team
    NewMember,
    /// A racer left the team
    MemberLeft,
    /// A regular member became an agent
    Promotion,
}

impl TeamEventKind {
    /// Every event kind, in delivery order.
    pub const ALL: [Self; 3] = [Self::NewMember, Self::MemberLeft, Self::Promotion];
}
