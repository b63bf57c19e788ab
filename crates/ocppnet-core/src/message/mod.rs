//! Message contracts and the OCPP 2.0.1 catalogue handled by the node.
//!
//! Every request implements [`OcppRequest`]: a decode contract from a
//! [`RequestEnvelope`] and a `to_json` contract whose serializers can be
//! overridden per type through [`CustomSerializers`]. Every response
//! implements [`OcppResponse`], which additionally knows how to build a local
//! rejection so the node can answer a filtered request itself.

pub mod boot_notification;
pub mod certificate_signed;
pub mod change_availability;
pub mod clear_cache;
pub mod common;
pub mod custom;
pub mod data_transfer;
pub mod reset;
pub mod sign_certificate;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{OcppNetError, Result};
use crate::protocol::{Action, RequestEnvelope, RequestId, RequestMeta};

pub use boot_notification::{BootNotificationRequest, BootNotificationResponse};
pub use certificate_signed::{CertificateSignedRequest, CertificateSignedResponse};
pub use change_availability::{ChangeAvailabilityRequest, ChangeAvailabilityResponse};
pub use clear_cache::{ClearCacheRequest, ClearCacheResponse};
pub use common::{
    CertificateSigningUse, CustomData, Evse, GenericStatus, ResponseResult, ResultCode, StatusInfo,
};
pub use custom::{CustomParsers, CustomSerializers};
pub use data_transfer::{DataTransferRequest, DataTransferResponse};
pub use reset::{ResetRequest, ResetResponse};
pub use sign_certificate::{SignCertificateRequest, SignCertificateResponse};

/// JSON rendering with per-type overridable serializers.
///
/// The default JSON comes from the serde derive. Types with nested objects
/// override [`ToJson::children_to_json`] so that overrides registered for the
/// nested types are honoured too; the override for `Self` runs last.
pub trait ToJson: Serialize + Sized + 'static {
    fn to_json(&self, serializers: &CustomSerializers) -> Value {
        let mut json = serde_json::to_value(self).unwrap_or(Value::Null);
        self.children_to_json(&mut json, serializers);
        serializers.apply(self, json)
    }

    /// Re-render nested objects through `serializers`.
    fn children_to_json(&self, _json: &mut Value, _serializers: &CustomSerializers) {}
}

/// A request the node can decode, filter and relay.
pub trait OcppRequest:
    ToJson + DeserializeOwned + Clone + fmt::Debug + PartialEq + Send + Sync
{
    /// Action tag used on the wire and in the dispatch table.
    const ACTION: Action;

    /// Matching response type.
    type Response: OcppResponse;

    fn meta(&self) -> &RequestMeta;
    fn meta_mut(&mut self) -> &mut RequestMeta;

    /// Constraints serde cannot express (OCPP `maxLength`, ranges).
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn request_id(&self) -> &RequestId {
        &self.meta().request_id
    }

    /// Decode a request from an envelope.
    ///
    /// Errors name the action and, for missing fields, the field. No partially
    /// decoded request ever escapes: the custom parser and validation both run
    /// before the value is returned.
    fn try_parse(envelope: &RequestEnvelope, parsers: &CustomParsers) -> Result<Self> {
        if !envelope.payload.is_object() {
            return Err(OcppNetError::FormatViolation(format!(
                "{}: payload must be a json object",
                Self::ACTION
            )));
        }
        let mut request: Self = serde_json::from_value(envelope.payload.clone())
            .map_err(|e| OcppNetError::FormatViolation(format!("{}: {e}", Self::ACTION)))?;
        *request.meta_mut() = envelope.meta.clone();

        let request = parsers.apply(&envelope.payload, request);
        request.validate()?;
        Ok(request)
    }
}

/// A response, either produced by the destination or synthesized locally.
pub trait OcppResponse:
    ToJson + DeserializeOwned + Clone + fmt::Debug + PartialEq + Send + Sync
{
    /// Local rejection for the request described by `meta`.
    fn rejected(meta: &RequestMeta, result: ResponseResult) -> Self;

    /// Out-of-band processing result (never serialized).
    fn result(&self) -> &ResponseResult;

    /// Decode a response produced by the destination.
    fn try_parse(payload: &Value) -> Result<Self> {
        if !payload.is_object() {
            return Err(OcppNetError::FormatViolation(
                "response payload must be a json object".into(),
            ));
        }
        serde_json::from_value(payload.clone())
            .map_err(|e| OcppNetError::FormatViolation(format!("response: {e}")))
    }
}
