use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Token missing, login rejected or the probe found no authenticated markup.
    /// The session is unusable; the caller has to log in again.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("missing credentials: environment variable {variable} is not set")]
    MissingCredentials { variable: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

impl SessionError {
    /// Whether the error invalidates the session.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Http {
                url: url.to_string(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::Authentication {
            reason: "anti-forgery token not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "authentication failed: anti-forgery token not found"
        );
        assert!(err.is_authentication());
    }

    #[test]
    fn test_status_error_is_not_authentication() {
        let err = SessionError::Status {
            url: "https://klavia.io/teams/VYN".to_string(),
            status: 503,
        };
        assert!(err.to_string().contains("503"));
        assert!(!err.is_authentication());
    }
}
