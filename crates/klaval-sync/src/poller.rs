//! The periodic driver.
//!
//! Logs in lazily, runs one cycle per tick and drops the session whenever a
//! cycle reports that the site no longer accepts it. Cycles never overlap:
//! a tick that fires while a cycle is still running is delayed.

use crate::cycle::{CycleReport, CycleRunner};
use crate::error::SyncError;
use klaval_scraper::Crawler;
use klaval_session::{Credentials, Session, SessionProvider};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub struct Poller {
    provider: SessionProvider,
    credentials: Credentials,
    runner: CycleRunner,
    interval: Duration,
    crawler: Option<Crawler<Session>>,
}

impl Poller {
    pub fn new(
        provider: SessionProvider,
        credentials: Credentials,
        runner: CycleRunner,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            credentials,
            runner,
            interval,
            crawler: None,
        }
    }

    /// Whether an authenticated session is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.crawler.is_some()
    }

    /// Run a single cycle, logging in first if needed.
    pub async fn tick(&mut self) -> CycleReport {
        let crawler = match self.crawler.take() {
            Some(crawler) => crawler,
            None => match self.provider.login(&self.credentials).await {
                Ok(session) => Crawler::new(session, self.provider.base_url().clone()),
                Err(e) => {
                    let e = SyncError::from(e);
                    warn!(error = %e, "login failed, retrying next tick");
                    return CycleReport::aborted("login", &e);
                }
            },
        };

        let report = self.runner.run(&crawler).await;

        if report.requires_reauthentication() {
            warn!(cycle_id = %report.cycle_id, "session expired, logging in again next tick");
        } else {
            self.crawler = Some(crawler);
        }
        report
    }

    /// Tick at the configured interval until `shutdown` resolves.
    ///
    /// The first cycle runs immediately.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval = ?self.interval, "poller started");
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    if let Some(first) = report.failures().next() {
                        warn!(
                            cycle_id = %report.cycle_id,
                            subtask = %first.subtask,
                            failed = report.failures().count(),
                            "cycle finished with failures"
                        );
                    };
                }
            }
        }
        info!("poller stopped");
    }
}
