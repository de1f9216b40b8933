//! Klaval Session - authenticated access to the racing site.
//!
//! Establishes one authenticated HTTP context per crawl through the site's
//! login form and its anti-forgery token, and exposes the [`PageSource`] seam
//! every extractor fetches its markup through.
//!
//! # Example
//!
//! ```rust,ignore
//! use klaval_core::AppConfig;
//! use klaval_session::{Credentials, SessionProvider};
//!
//! let config = AppConfig::load_with_env()?;
//! let provider = SessionProvider::new(&config.site, &config.session)?;
//! let session = provider.login(&Credentials::from_env()?).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod credentials;
#[allow(missing_docs)]
pub mod error;
pub mod session;
pub mod source;

// Re-export commonly used types
pub use credentials::Credentials;
pub use error::{Result, SessionError};
pub use session::{extract_csrf_token, normalize_base_url, Session, SessionProvider};
pub use source::{PageSource, ReplaySource};
pub use url::Url;
