//! Klaval process shell.
//!
//! Wires configuration, credentials, the snapshot store and the logging sink
//! into a [`Poller`] and runs it until Ctrl-C. Core logic lives in `crates/`.

mod sink;

pub use sink::LogSink;

use anyhow::Context;
use klaval_core::{AppConfig, TeamTag};
use klaval_session::{Credentials, SessionProvider};
use klaval_store::SnapshotStore;
use klaval_sync::{CycleRunner, Poller};
use std::sync::Arc;
use tracing::{info, warn};

/// Comma-separated team tags to track on startup.
pub const TEAMS_VAR: &str = "KLAVAL_TEAMS";

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,klaval=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Parse a `KLAVAL_TEAMS` value. Empty entries are ignored.
pub fn parse_team_list(value: &str) -> anyhow::Result<Vec<TeamTag>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| TeamTag::new(tag).with_context(|| format!("invalid team tag '{tag}'")))
        .collect()
}

/// Run the tracker until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Klaval v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("loading configuration")?;
    let credentials = Credentials::from_env().context("reading credentials")?;
    let provider = SessionProvider::new(&config.site, &config.session)
        .context("configuring the site session")?;

    let state_path = config
        .state_file_path()
        .context("resolving the snapshot document path")?;
    info!(path = %state_path.display(), "using snapshot document");
    let store = Arc::new(SnapshotStore::new(state_path));

    if let Ok(teams) = std::env::var(TEAMS_VAR) {
        for tag in parse_team_list(&teams)? {
            store
                .track_team(tag.as_str(), tag.clone())
                .await
                .with_context(|| format!("tracking team {tag}"))?;
        }
    }

    let runner = CycleRunner::new(store, Arc::new(LogSink), &config.polling);
    let mut poller = Poller::new(provider, credentials, runner, config.polling.interval());

    poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Klaval stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_team_list() {
        let tags = parse_team_list(" vyn, ,abc ").expect("valid list");
        let tags: Vec<_> = tags.iter().map(TeamTag::as_str).collect();
        assert_eq!(tags, vec!["VYN", "ABC"]);

        assert!(parse_team_list("").expect("empty list").is_empty());
    }
}
