//! Klaval Core - Foundation crate for the Klaval team tracker.
//!
//! This crate provides shared types, error handling and configuration
//! management that all other Klaval crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`RacerId`, `TeamTag`, `TeamRole`, `TeamEventKind`)
//!
//! # Example
//!
//! ```rust
//! use klaval_core::{AppConfig, TeamTag};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.site.base_url, "https://klavia.io");
//!
//! let tag = TeamTag::new("vyn")?;
//! assert_eq!(tag.as_str(), "VYN");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, PollingConfig, SessionConfig, SiteConfig, StorageConfig, VerificationConfig,
};
pub use error::{ConfigError, ConfigResult, KlavalError, Result};
pub use types::{RacerId, TeamEventKind, TeamRole, TeamTag};
