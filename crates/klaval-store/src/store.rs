//! File-backed snapshot store.

use crate::error::{Result, StoreError};
use crate::state::{PersistedState, TrackedTeam};
use klaval_core::{TeamEventKind, TeamTag};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Durable record of the last known state of every tracked team and of the
/// shop inventory.
///
/// All access goes through one lock, so no reader sees a half-written file
/// and no two writers interleave. The in-memory copy is reused by [`load`];
/// [`reload`] re-reads the file to pick up another writer's changes.
///
/// [`load`]: SnapshotStore::load
/// [`reload`]: SnapshotStore::reload
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    cache: Mutex<Option<PersistedState>>,
}

impl SnapshotStore {
    /// Create a store backed by `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state. A missing file is the empty state, not an error.
    pub async fn load(&self) -> Result<PersistedState> {
        let mut cache = self.cache.lock().await;
        if let Some(state) = cache.as_ref() {
            return Ok(state.clone());
        }
        let state = self.read_file().await?;
        *cache = Some(state.clone());
        Ok(state)
    }

    /// Re-read the file, discarding the in-memory copy.
    pub async fn reload(&self) -> Result<PersistedState> {
        let mut cache = self.cache.lock().await;
        let state = self.read_file().await?;
        *cache = Some(state.clone());
        Ok(state)
    }

    /// Replace the persisted state with `state`.
    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        let mut cache = self.cache.lock().await;
        self.write_file(state).await?;
        *cache = Some(state.clone());
        Ok(())
    }

    /// Read-modify-write under the lock.
    ///
    /// The state is read fresh from disk, `change` is applied and the result
    /// written back. If writing fails the in-memory copy is left untouched.
    pub async fn update<T>(&self, change: impl FnOnce(&mut PersistedState) -> T) -> Result<T> {
        let mut cache = self.cache.lock().await;
        let mut state = self.read_file().await?;
        let output = change(&mut state);
        self.write_file(&state).await?;
        *cache = Some(state);
        Ok(output)
    }

    /// Start tracking `tag` under `tracking_id`.
    ///
    /// Re-tracking the same tag keeps its settings and cached roster; a
    /// different tag starts over with no cached roster.
    pub async fn track_team(&self, tracking_id: &str, tag: TeamTag) -> Result<()> {
        self.update(|state| {
            let entry = state
                .teams
                .entry(tracking_id.to_string())
                .or_insert_with(|| TrackedTeam::new(tag.clone()));
            if entry.tag != tag {
                entry.tag = tag.clone();
                entry.cached_state = None;
            }
        })
        .await?;
        info!(tracking_id, team = %tag, "tracking team");
        Ok(())
    }

    /// Stop tracking. Returns whether a team was tracked.
    pub async fn untrack_team(&self, tracking_id: &str) -> Result<bool> {
        let removed = self
            .update(|state| state.teams.remove(tracking_id).is_some())
            .await?;
        if removed {
            info!(tracking_id, "stopped tracking team");
        }
        Ok(removed)
    }

    /// Choose which events of a tracked team are handed to the consumer.
    pub async fn set_notify_events(
        &self,
        tracking_id: &str,
        events: BTreeSet<TeamEventKind>,
    ) -> Result<()> {
        self.update(|state| match state.teams.get_mut(tracking_id) {
            Some(team) => {
                team.settings.notify_events = events;
                Ok(())
            }
            None => Err(StoreError::NotTracked(tracking_id.to_string())),
        })
        .await?
    }

    async fn read_file(&self) -> Result<PersistedState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet, starting empty");
                return Ok(PersistedState::default());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| {
            error!(path = %self.path.display(), error = %source, "state file is corrupt");
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Write to a sibling temp file, then rename over the target.
    async fn write_file(&self, state: &PersistedState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            error!(path = %self.path.display(), error = %e, "failed to replace state file");
            StoreError::io(&self.path, e)
        })?;

        debug!(path = %self.path.display(), bytes = json.len(), "state saved");
        Ok(())
    }
}
