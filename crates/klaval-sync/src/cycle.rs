//! One poll cycle: extract, diff, dispatch, persist.
//!
//! Every tracked team and the shop are independent sub-tasks. A sub-task
//! failure is recorded in the cycle report and never stops its siblings,
//! except for authentication failures, which end the cycle because every
//! later request would fail the same way.

use crate::diff::{cached_state_of, diff_team, next_offer_set, novel_offers};
use crate::error::{Result, SyncError};
use crate::events::TeamEvent;
use crate::sink::EventSink;
use chrono::{DateTime, Utc};
use klaval_core::PollingConfig;
use klaval_scraper::Crawler;
use klaval_session::PageSource;
use klaval_store::{SnapshotStore, TrackedTeam};
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of one sub-task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtaskReport {
    pub subtask: String,
    pub events_dispatched: usize,
    pub error: Option<String>,
    pub requires_reauthentication: bool,
}

impl SubtaskReport {
    fn succeeded(subtask: String, events_dispatched: usize) -> Self {
        Self {
            subtask,
            events_dispatched,
            error: None,
            requires_reauthentication: false,
        }
    }

    pub(crate) fn failed(subtask: String, error: &SyncError) -> Self {
        Self {
            subtask,
            events_dispatched: 0,
            error: Some(error.to_string()),
            requires_reauthentication: error.requires_reauthentication(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub subtasks: Vec<SubtaskReport>,
}

impl CycleReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            subtasks: Vec::new(),
        }
    }

    /// A cycle that failed before any sub-task ran.
    pub(crate) fn aborted(subtask: &str, error: &SyncError) -> Self {
        let mut report = Self::start();
        report.subtasks.push(SubtaskReport::failed(subtask.to_string(), error));
        report
    }

    #[must_use]
    pub fn events_dispatched(&self) -> usize {
        self.subtasks.iter().map(|s| s.events_dispatched).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SubtaskReport> {
        self.subtasks.iter().filter(|s| !s.is_success())
    }

    #[must_use]
    pub fn requires_reauthentication(&self) -> bool {
        self.subtasks.iter().any(|s| s.requires_reauthentication)
    }
}

/// Runs poll cycles against one store and one consumer.
pub struct CycleRunner {
    store: Arc<SnapshotStore>,
    sink: Arc<dyn EventSink>,
    subtask_timeout: Duration,
    pause: Duration,
}

impl CycleRunner {
    pub fn new(store: Arc<SnapshotStore>, sink: Arc<dyn EventSink>, config: &PollingConfig) -> Self {
        Self {
            store,
            sink,
            subtask_timeout: config.subtask_timeout(),
            pause: config.notify_pause(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Run one cycle: every tracked team, then the shop.
    pub async fn run<S: PageSource>(&self, crawler: &Crawler<S>) -> CycleReport {
        let mut report = CycleReport::start();
        info!(cycle_id = %report.cycle_id, "poll cycle started");

        let state = match self.store.reload().await {
            Ok(state) => state,
            Err(e) => {
                let e = SyncError::from(e);
                error!(cycle_id = %report.cycle_id, error = %e, "cannot load persisted state");
                report.subtasks.push(SubtaskReport::failed("load state".to_string(), &e));
                report.finished_at = Utc::now();
                return report;
            }
        };

        for (tracking_id, team) in &state.teams {
            let subtask = format!("team {tracking_id} [{}]", team.tag);
            let outcome = self
                .guarded(subtask, self.sync_team(crawler, tracking_id, team))
                .await;
            let stop = outcome.requires_reauthentication;
            report.subtasks.push(outcome);
            if stop {
                warn!(cycle_id = %report.cycle_id, "session rejected, ending cycle early");
                report.finished_at = Utc::now();
                return report;
            }
            self.pause().await;
        }

        let outcome = self
            .guarded("shop".to_string(), self.sync_shop(crawler, &state.shop_offers))
            .await;
        report.subtasks.push(outcome);

        report.finished_at = Utc::now();
        info!(
            cycle_id = %report.cycle_id,
            subtasks = report.subtasks.len(),
            failed = report.failures().count(),
            events = report.events_dispatched(),
            "poll cycle finished"
        );
        report
    }

    async fn pause(&self) {
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
    }

    /// Bound a sub-task by the configured timeout and fold its result into a report.
    async fn guarded(
        &self,
        subtask: String,
        work: impl Future<Output = Result<usize>>,
    ) -> SubtaskReport {
        match tokio::time::timeout(self.subtask_timeout, work).await {
            Ok(Ok(dispatched)) => SubtaskReport::succeeded(subtask, dispatched),
            Ok(Err(e)) => {
                warn!(subtask = %subtask, error = %e, "sub-task failed, retrying next cycle");
                SubtaskReport::failed(subtask, &e)
            }
            Err(_) => {
                let e = SyncError::Timeout {
                    subtask: subtask.clone(),
                    after: self.subtask_timeout,
                };
                warn!(subtask = %subtask, error = %e, "sub-task timed out, retrying next cycle");
                SubtaskReport::failed(subtask, &e)
            }
        }
    }

    async fn sync_team<S: PageSource>(
        &self,
        crawler: &Crawler<S>,
        tracking_id: &str,
        tracked: &TrackedTeam,
    ) -> Result<usize> {
        let snapshot = crawler.team(&tracked.tag).await?;
        let mut events = diff_team(&snapshot, tracked.cached_state.as_ref());

        for event in &mut events {
            if let TeamEvent::MemberLeft { id, identity } = event {
                match crawler.resolve_racer(id).await {
                    Ok(found) => *identity = Some(found),
                    Err(e) if e.is_authentication() => return Err(e.into()),
                    Err(e) => warn!(racer = %id, error = %e, "cannot resolve departed member"),
                }
            }
        }

        let computed = events.len();
        let notify: Vec<TeamEvent> = events
            .into_iter()
            .filter(|e| tracked.settings.notifies(e.kind()))
            .collect();
        if !notify.is_empty() {
            self.sink
                .team_events(tracking_id, &snapshot, &notify)
                .await?;
        }

        let next = cached_state_of(&snapshot);
        if tracked.cached_state.as_ref() != Some(&next) {
            let tag = tracked.tag.clone();
            let persisted = self
                .store
                .update(|state| match state.teams.get_mut(tracking_id) {
                    Some(team) if team.tag == tag => {
                        team.cached_state = Some(next);
                        true
                    }
                    _ => false,
                })
                .await?;
            if !persisted {
                debug!(tracking_id, "team untracked or retagged during cycle, snapshot dropped");
            }
        }

        info!(
            tracking_id,
            team = %tracked.tag,
            computed,
            dispatched = notify.len(),
            "team reconciled"
        );
        Ok(notify.len())
    }

    async fn sync_shop<S: PageSource>(
        &self,
        crawler: &Crawler<S>,
        seen: &BTreeSet<String>,
    ) -> Result<usize> {
        let shop = crawler.shop().await?;
        let novel = novel_offers(&shop, seen);
        if !novel.is_empty() {
            self.sink.shop_offers(&novel).await?;
        }

        let next = next_offer_set(&shop);
        if &next != seen {
            self.store
                .update(|state| state.shop_offers = next)
                .await?;
        }

        info!(novel = novel.len(), "shop reconciled");
        Ok(novel.len())
    }
}
