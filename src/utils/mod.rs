//!
//! Utility module for the poll engine.
//!
//! Re-exports formatting helpers and the wall clock used for expiry checks.
/// Utility functions for formatting and time
pub mod index;

pub use index::{short_address, unix_now};
