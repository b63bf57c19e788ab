//! Transport glue (OCPP-J frames).
//!
//! Exposes the codec that turns inbound frames into envelopes and pipeline
//! decisions into outbound frames. Socket handling stays outside this crate.

pub mod codec;

pub use codec::{envelope_from_call, outbound, Outbound};
