//! Protocol modules (envelope metadata, action tags, OCPP-J frames).
//!
//! - `envelope`: identifiers and the inbound request envelope handed to the
//!   forwarding pipeline.
//! - `action`: the closed set of message types this node understands.
//! - `frame`: OCPP-J CALL / CALLRESULT / CALLERROR arrays.
//!
//! All parsers are panic-free: malformed input is reported as `OcppNetError`.

pub mod action;
pub mod envelope;
pub mod frame;

pub use action::Action;
pub use envelope::{
    EventTrackingId, NetworkPath, NetworkingNodeId, RequestEnvelope, RequestId, RequestMeta,
};
pub use frame::{OcppFrame, MAX_MESSAGE_ID_LEN};
