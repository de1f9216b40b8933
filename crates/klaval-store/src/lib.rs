//! Klaval Store - durable snapshot of tracked teams and the shop inventory.
//!
//! The store holds the only state that outlives a poll cycle: the cached
//! roster of every tracked team and the set of shop offer names seen so far.
//! It is a single JSON document replaced as a whole on every save.
//!
//! # Example
//!
//! ```ignore
//! use klaval_store::SnapshotStore;
//!
//! let store = SnapshotStore::new(config.state_file_path()?);
//! store.track_team("guild-1", TeamTag::new("vyn")?).await?;
//! let state = store.load().await?;
//! ```
//!
//! # Design Principles
//!
//! - Loading a missing file yields the empty state
//! - Saves go to a temp file that is renamed over the target
//! - One lock guards every read and write

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
#[allow(missing_docs)]
pub mod state;
pub mod store;

// Re-export commonly used types
pub use error::{Result, StoreError};
pub use state::{CachedMember, CachedTeamState, PersistedState, TeamSettings, TrackedTeam};
pub use store::SnapshotStore;
