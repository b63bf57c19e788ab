//! Connection context shared across layers.
//!
//! The pipeline and its subscribers see who sent a request through
//! [`ConnectionInfo`] without coupling to transport specifics.

pub mod connection;

pub use connection::ConnectionInfo;
