//! Types shared by several messages.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{CustomSerializers, ToJson};
use crate::error::{OcppNetError, Result};
use crate::protocol::Action;

/// `StatusInfo.additionalInfo` maximum length.
const MAX_ADDITIONAL_INFO: usize = 512;

/// Vendor extension object allowed on every OCPP 2.0.1 type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    pub vendor_id: String,
    /// Vendor specific properties.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomData {
    pub fn new(vendor_id: impl Into<String>) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            extra: Map::new(),
        }
    }

    pub(crate) fn validate(&self, action: Action) -> Result<()> {
        check_max_len(action, "customData.vendorId", &self.vendor_id, 255)
    }
}

impl ToJson for CustomData {}

/// Additional status information in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusInfo {
    pub reason_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl StatusInfo {
    /// Status info describing a local processing result.
    pub fn from_result(result: &ResponseResult) -> Self {
        Self {
            reason_code: result.code.as_str().to_string(),
            additional_info: result
                .description
                .as_ref()
                .map(|d| d.chars().take(MAX_ADDITIONAL_INFO).collect()),
            custom_data: None,
        }
    }
}

impl ToJson for StatusInfo {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

/// How a response came to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultCode {
    /// Produced by the destination.
    #[default]
    Ok,
    /// Synthesized by a node that refused to forward the request.
    Filtered,
    /// Synthesized because the request could not be decoded.
    FormatViolation,
}

impl ResultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Ok => "OK",
            ResultCode::Filtered => "Filtered",
            ResultCode::FormatViolation => "FormatViolation",
        }
    }
}

/// Out-of-band processing result attached to every response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseResult {
    pub code: ResultCode,
    pub description: Option<String>,
}

impl ResponseResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn filtered(reason: impl Into<String>) -> Self {
        Self {
            code: ResultCode::Filtered,
            description: Some(reason.into()),
        }
    }

    pub fn format_violation(reason: impl Into<String>) -> Self {
        Self {
            code: ResultCode::FormatViolation,
            description: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Ok
    }
}

/// Accepted/Rejected status used by several responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenericStatus {
    Accepted,
    Rejected,
}

/// Certificate kinds a charging station can request or install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateSigningUse {
    ChargingStationCertificate,
    V2GCertificate,
}

/// EVSE reference (`connectorId` narrows it to one connector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Evse {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for Evse {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

/// Replace `key` in `json` with the custom rendering of `child`.
pub(crate) fn put_child<T: ToJson>(
    json: &mut Value,
    key: &str,
    child: Option<&T>,
    serializers: &CustomSerializers,
) {
    if let (Some(obj), Some(child)) = (json.as_object_mut(), child) {
        obj.insert(key.to_string(), child.to_json(serializers));
    }
}

/// Field deserializer keeping an explicit `null` apart from an absent field.
///
/// Used with `#[serde(default)]`: absent stays `None`, `null` becomes `Some(None)`.
pub(crate) fn present_or_null<'de, D, T>(d: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

pub(crate) fn check_max_len(action: Action, field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(OcppNetError::PropertyConstraint(format!(
            "{action}: {field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}

pub(crate) fn check_non_negative(action: Action, field: &str, value: i32) -> Result<()> {
    if value < 0 {
        return Err(OcppNetError::PropertyConstraint(format!(
            "{action}: {field} must not be negative, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_custom_data(action: Action, custom_data: Option<&CustomData>) -> Result<()> {
    match custom_data {
        Some(cd) => cd.validate(action),
        None => Ok(()),
    }
}
