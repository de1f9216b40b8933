//! Klaval Sync - change detection and the poll cycle.
//!
//! Compares freshly extracted team rosters and shop listings against the
//! persisted snapshots, hands the resulting events to an [`EventSink`] and
//! advances the snapshots once the sink accepted them.
//!
//! # Example
//!
//! ```rust,ignore
//! use klaval_sync::{CycleRunner, Poller};
//!
//! let runner = CycleRunner::new(store, sink, &config.polling);
//! let mut poller = Poller::new(provider, credentials, runner, config.polling.interval());
//! poller.run(async { let _ = tokio::signal::ctrl_c().await; }).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod cycle;
pub mod diff;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod events;
#[allow(missing_docs)]
pub mod poller;
pub mod sink;
#[allow(missing_docs)]
pub mod verification;

// Re-export commonly used types
pub use cycle::{CycleReport, CycleRunner, SubtaskReport};
pub use diff::{cached_state_of, diff_team, next_offer_set, novel_offers};
pub use error::{Result, SyncError};
pub use events::{NewShopOffer, TeamEvent};
pub use poller::Poller;
pub use sink::EventSink;
pub use verification::{await_verification, VerificationChallenge};
