use klaval_scraper::ScrapeError;
use klaval_session::SessionError;
use klaval_store::StoreError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),

    #[error("event consumer failed: {0}")]
    Sink(String),

    #[error("{subtask} timed out after {after:?}")]
    Timeout { subtask: String, after: Duration },

    #[error("verification not possible: {0}")]
    Verification(String),
}

impl SyncError {
    /// Whether the session must be re-established before the next extraction.
    #[must_use]
    pub fn requires_reauthentication(&self) -> bool {
        match self {
            Self::Session(e) => e.is_authentication(),
            Self::Scrape(e) => e.is_authentication(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_reauthentication() {
        let auth = SyncError::Scrape(ScrapeError::Session(SessionError::Authentication {
            reason: "expired".to_string(),
        }));
        assert!(auth.requires_reauthentication());

        let transport = SyncError::Session(SessionError::Timeout {
            url: "https://klavia.io/shops/season-shop".to_string(),
        });
        assert!(!transport.requires_reauthentication());

        let sink = SyncError::Sink("channel gone".to_string());
        assert!(!sink.requires_reauthentication());
    }
}
