#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

//! Shared types for the Payout withdrawal watcher.
//!
//! The `client` feature adds HTTP clients for the wallet gateways the
//! watcher talks to.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
