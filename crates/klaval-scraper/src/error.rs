use klaval_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Extraction failed for {entity}.{field}: {reason}")]
    Extraction {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ScrapeError {
    pub(crate) fn extraction(entity: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Extraction {
            entity,
            field,
            reason: reason.into(),
        }
    }

    /// Whether the underlying session has to be re-established.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Session(e) if e.is_authentication())
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
