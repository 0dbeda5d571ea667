//! On-chain state readers and report codecs for cross-chain lane contracts.
//!
//! A caller asks [`factory`] for a reader at an address. The factory reads the
//! contract's `typeAndVersion()`, picks the matching versioned reader and
//! registers its log filters. Readers then answer queries from the shared
//! [`EventStore`](common::event_cache::EventStore) and direct contract calls.

pub mod caller;
pub mod codec;
pub mod config;
pub mod errors;
pub mod factory;
pub mod hashing;
pub mod logs;
pub mod merkle;
pub mod prices;
pub mod rate_limiter;
pub mod readers;
pub mod settings;
pub mod types;
pub mod version;

#[cfg(test)]
pub(crate) mod testutils;

pub use errors::{CcipDataError, Result};
pub use factory::ChainContext;
