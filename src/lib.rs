//! Client-side reconciliation engine for polls recorded on a ledger contract.
//!
//! The ledger is authoritative for poll existence and vote tallies. This crate mirrors that
//! state into a session-scoped view, derives filtered subsets for display, serializes
//! user-initiated mutations (vote, create) and reports outcomes through a single transient
//! feedback message.

/// Mutating operations and the busy gate
pub mod actions;
/// Engine configuration
pub mod config;
/// Error taxonomy surfaced by the engine
pub mod error;
/// Transient status message with self-expiry
pub mod feedback;
/// Ledger contract integration
pub mod ledger;
/// Session-scoped application state and its controller
pub mod session;
/// Read paths that pull ledger state into the local view
pub mod sync;
/// Formatting and clock helpers
pub mod utils;
/// Pure derivation of the displayed poll subset
pub mod view;
/// Wallet account integration
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use error::{ActionError, ValidationError};
pub use session::{PollSession, SessionSnapshot};
