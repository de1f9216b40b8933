//! Login credentials.
//!
//! Credentials are supplied by the caller and never generated or persisted by
//! this crate. The password is zeroized from memory when dropped.

use crate::error::{Result, SessionError};
use std::fmt;
use zeroize::Zeroizing;

/// Environment variable holding the login name or e-mail.
pub const USERNAME_VAR: &str = "KLAVAL_USERNAME";

/// Environment variable holding the password.
pub const PASSWORD_VAR: &str = "KLAVAL_PASSWORD";

/// Username (or e-mail) and password for the site's login form.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Create credentials from explicit values.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Read credentials from `KLAVAL_USERNAME` and `KLAVAL_PASSWORD`.
    ///
    /// # Errors
    /// Returns `SessionError::MissingCredentials` naming the first unset variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through a key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let username = lookup(USERNAME_VAR).ok_or_else(|| SessionError::MissingCredentials {
            variable: USERNAME_VAR.to_string(),
        })?;
        let password = lookup(PASSWORD_VAR).ok_or_else(|| SessionError::MissingCredentials {
            variable: PASSWORD_VAR.to_string(),
        })?;
        Ok(Self::new(username, password))
    }

    /// Login name or e-mail.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new("racer@example.com", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("racer@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_from_lookup() {
        let credentials = Credentials::from_lookup(|key| match key {
            USERNAME_VAR => Some("racer".to_string()),
            PASSWORD_VAR => Some("secret".to_string()),
            _ => None,
        })
        .expect("both variables set");
        assert_eq!(credentials.username(), "racer");
        assert_eq!(credentials.password(), "secret");
    }

    #[test]
    fn test_from_lookup_missing_password() {
        let err = Credentials::from_lookup(|key| {
            (key == USERNAME_VAR).then(|| "racer".to_string())
        })
        .expect_err("password is missing");
        assert!(matches!(
            err,
            SessionError::MissingCredentials { variable } if variable == PASSWORD_VAR
        ));
    }
}
