//! ocppnet core: transport-agnostic OCPP primitives, error types and the
//! message catalogue.
//!
//! This crate defines the wire-level contracts shared by the networking node,
//! its filters and test tooling: request envelopes, OCPP-J framing, the
//! decode/serialize contract every message implements, and a representative
//! OCPP 2.0.1 message set. It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `OcppNetError`/`Result` so a node never
//! crashes on malformed input from a charging station or CSMS.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod message;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, OcppNetError, Result};
