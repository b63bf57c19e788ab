//! Shared error type across ocppnet crates.

use thiserror::Error;

/// OCPP-J CALLERROR codes (stable wire API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Payload is syntactically incorrect or does not conform to the schema.
    FormatViolation,
    /// Any other error not covered by the more specific codes.
    GenericError,
    /// An internal error occurred while processing the message.
    InternalError,
    /// A message with a MessageTypeNumber was received that is not supported.
    MessageTypeNotSupported,
    /// Requested action is not known by the receiver.
    NotImplemented,
    /// Requested action is recognized but not supported.
    NotSupported,
    /// Payload violates occurrence constraints.
    OccurrenceConstraintViolation,
    /// A field contains a value that is out of range or too long.
    PropertyConstraintViolation,
    /// Payload is incomplete.
    ProtocolError,
    /// The message frame itself could not be read.
    RpcFrameworkError,
    /// Security violation.
    SecurityError,
    /// A field has the wrong data type.
    TypeConstraintViolation,
}

impl ErrorCode {
    /// String representation used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::FormatViolation => "FormatViolation",
            ErrorCode::GenericError => "GenericError",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::MessageTypeNotSupported => "MessageTypeNotSupported",
            ErrorCode::NotImplemented => "NotImplemented",
            ErrorCode::NotSupported => "NotSupported",
            ErrorCode::OccurrenceConstraintViolation => "OccurrenceConstraintViolation",
            ErrorCode::PropertyConstraintViolation => "PropertyConstraintViolation",
            ErrorCode::ProtocolError => "ProtocolError",
            ErrorCode::RpcFrameworkError => "RpcFrameworkError",
            ErrorCode::SecurityError => "SecurityError",
            ErrorCode::TypeConstraintViolation => "TypeConstraintViolation",
        }
    }

    /// Parse a wire code. Unknown codes collapse to `GenericError`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "FormatViolation" | "FormationViolation" => ErrorCode::FormatViolation,
            "InternalError" => ErrorCode::InternalError,
            "MessageTypeNotSupported" => ErrorCode::MessageTypeNotSupported,
            "NotImplemented" => ErrorCode::NotImplemented,
            "NotSupported" => ErrorCode::NotSupported,
            "OccurrenceConstraintViolation" => ErrorCode::OccurrenceConstraintViolation,
            "PropertyConstraintViolation" => ErrorCode::PropertyConstraintViolation,
            "ProtocolError" => ErrorCode::ProtocolError,
            "RpcFrameworkError" => ErrorCode::RpcFrameworkError,
            "SecurityError" => ErrorCode::SecurityError,
            "TypeConstraintViolation" => ErrorCode::TypeConstraintViolation,
            _ => ErrorCode::GenericError,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, OcppNetError>;

/// Unified error type used by core and node.
#[derive(Debug, Error)]
pub enum OcppNetError {
    #[error("format violation: {0}")]
    FormatViolation(String),
    #[error("property constraint violation: {0}")]
    PropertyConstraint(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("action not registered: {0}")]
    NotImplemented(String),
    #[error("rpc framework error: {reason}")]
    Frame {
        message_id: Option<String>,
        reason: String,
    },
    #[error("duplicate request id: {0}")]
    DuplicateRequestId(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl OcppNetError {
    /// Map internal error to a stable OCPP-J error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            OcppNetError::FormatViolation(_) => ErrorCode::FormatViolation,
            OcppNetError::PropertyConstraint(_) => ErrorCode::PropertyConstraintViolation,
            OcppNetError::UnknownAction(_) => ErrorCode::NotImplemented,
            OcppNetError::NotImplemented(_) => ErrorCode::NotImplemented,
            OcppNetError::Frame { .. } => ErrorCode::RpcFrameworkError,
            OcppNetError::DuplicateRequestId(_) => ErrorCode::RpcFrameworkError,
            OcppNetError::BadConfig(_) => ErrorCode::GenericError,
            OcppNetError::UnsupportedVersion => ErrorCode::GenericError,
            OcppNetError::Internal(_) => ErrorCode::InternalError,
        }
    }
}
