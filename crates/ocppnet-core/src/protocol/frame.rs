//! OCPP-J RPC framing.
//!
//! OCPP-J carries every message as a JSON array:
//! - CALL: `[2, messageId, action, payload]`
//! - CALLRESULT: `[3, messageId, payload]`
//! - CALLERROR: `[4, messageId, errorCode, errorDescription, errorDetails]`
//!
//! Parsing never indexes the array directly; errors carry the message id
//! whenever it could be read so the caller can still answer with a CALLERROR.

use serde_json::{json, Map, Value};

use crate::error::{ErrorCode, OcppNetError, Result};

const MSG_CALL: u64 = 2;
const MSG_CALL_RESULT: u64 = 3;
const MSG_CALL_ERROR: u64 = 4;

/// Maximum message id length allowed by OCPP-J.
pub const MAX_MESSAGE_ID_LEN: usize = 36;

/// One OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OcppFrame {
    Call {
        message_id: String,
        action: String,
        payload: Value,
    },
    CallResult {
        message_id: String,
        payload: Value,
    },
    CallError {
        message_id: String,
        code: ErrorCode,
        description: String,
        details: Value,
    },
}

fn frame_err(message_id: Option<&str>, reason: impl Into<String>) -> OcppNetError {
    OcppNetError::Frame {
        message_id: message_id.map(str::to_string),
        reason: reason.into(),
    }
}

impl OcppFrame {
    /// Build a CALLERROR with empty details.
    pub fn call_error(message_id: impl Into<String>, code: ErrorCode, description: impl Into<String>) -> Self {
        OcppFrame::CallError {
            message_id: message_id.into(),
            code,
            description: description.into(),
            details: Value::Object(Map::new()),
        }
    }

    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| frame_err(None, format!("invalid json: {e}")))?;
        Self::from_value(value)
    }

    /// Interpret an already parsed JSON value as a frame.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(frame_err(None, "frame must be a json array"));
        };

        let message_id = items
            .get(1)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| frame_err(None, "missing message id"))?;
        let id = Some(message_id.as_str());

        if message_id.is_empty() || message_id.len() > MAX_MESSAGE_ID_LEN {
            return Err(frame_err(id, "message id must be 1..=36 characters"));
        }

        let kind = items
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| frame_err(id, "missing message type"))?;

        let arity = items.len();
        let mut rest = items.into_iter().skip(2);

        match kind {
            MSG_CALL => {
                if arity != 4 {
                    return Err(frame_err(id, format!("CALL must have 4 elements, got {arity}")));
                }
                let action = rest
                    .next()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or_else(|| frame_err(id, "CALL action must be a string"))?;
                let payload = rest
                    .next()
                    .filter(Value::is_object)
                    .ok_or_else(|| frame_err(id, "CALL payload must be an object"))?;
                Ok(OcppFrame::Call { message_id, action, payload })
            }
            MSG_CALL_RESULT => {
                if arity != 3 {
                    return Err(frame_err(id, format!("CALLRESULT must have 3 elements, got {arity}")));
                }
                let payload = rest
                    .next()
                    .filter(Value::is_object)
                    .ok_or_else(|| frame_err(id, "CALLRESULT payload must be an object"))?;
                Ok(OcppFrame::CallResult { message_id, payload })
            }
            MSG_CALL_ERROR => {
                if arity != 5 {
                    return Err(frame_err(id, format!("CALLERROR must have 5 elements, got {arity}")));
                }
                let code = rest
                    .next()
                    .and_then(|v| v.as_str().map(ErrorCode::from_wire))
                    .ok_or_else(|| frame_err(id, "CALLERROR code must be a string"))?;
                let description = rest
                    .next()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or_else(|| frame_err(id, "CALLERROR description must be a string"))?;
                let details = rest.next().unwrap_or(Value::Null);
                Ok(OcppFrame::CallError { message_id, code, description, details })
            }
            other => Err(frame_err(id, format!("unknown message type: {other}"))),
        }
    }

    pub fn message_id(&self) -> &str {
        match self {
            OcppFrame::Call { message_id, .. }
            | OcppFrame::CallResult { message_id, .. }
            | OcppFrame::CallError { message_id, .. } => message_id,
        }
    }

    /// Render as a JSON array.
    pub fn to_value(&self) -> Value {
        match self {
            OcppFrame::Call { message_id, action, payload } => {
                json!([MSG_CALL, message_id, action, payload])
            }
            OcppFrame::CallResult { message_id, payload } => {
                json!([MSG_CALL_RESULT, message_id, payload])
            }
            OcppFrame::CallError { message_id, code, description, details } => {
                json!([MSG_CALL_ERROR, message_id, code.as_str(), description, details])
            }
        }
    }

    /// Render as a text frame.
    pub fn to_text(&self) -> String {
        self.to_value().to_string()
    }
}
