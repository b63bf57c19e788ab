//! Dispatcher module exports.
//!
//! Re-exports the dispatch table and the type-erased forwarder trait so
//! downstream consumers can depend on this module directly.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, MessageForwarder, TypedForwarder};
