//! ocppnet networking node library entry.
//!
//! This crate wires the forwarding pipeline, action rule policy, dispatch
//! table and OCPP-J codec into a networking node. It is intended to be
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod forwarding;
pub mod node;
pub mod obs;
pub mod policy;
pub mod transport;

pub use node::NetworkingNode;
