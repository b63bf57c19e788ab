//! ChangeAvailability (CSMS -> charging station).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{check_non_negative, put_child, validate_custom_data, Evse};
use super::{
    CustomData, CustomSerializers, OcppRequest, OcppResponse, ResponseResult, StatusInfo, ToJson,
};
use crate::error::Result;
use crate::protocol::{Action, RequestMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalStatus {
    Inoperative,
    Operative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAvailabilityStatus {
    Accepted,
    Rejected,
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangeAvailabilityRequest {
    #[serde(skip)]
    pub meta: RequestMeta,
    pub operational_status: OperationalStatus,
    /// Absent means the whole charging station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse: Option<Evse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for ChangeAvailabilityRequest {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "evse", self.evse.as_ref(), serializers);
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppRequest for ChangeAvailabilityRequest {
    const ACTION: Action = Action::ChangeAvailability;
    type Response = ChangeAvailabilityResponse;

    fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RequestMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<()> {
        if let Some(evse) = &self.evse {
            check_non_negative(Self::ACTION, "evse.id", evse.id)?;
            if let Some(connector_id) = evse.connector_id {
                check_non_negative(Self::ACTION, "evse.connectorId", connector_id)?;
            }
            validate_custom_data(Self::ACTION, evse.custom_data.as_ref())?;
        }
        validate_custom_data(Self::ACTION, self.custom_data.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangeAvailabilityResponse {
    #[serde(skip)]
    pub result: ResponseResult,
    pub status: ChangeAvailabilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for ChangeAvailabilityResponse {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "statusInfo", self.status_info.as_ref(), serializers);
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppResponse for ChangeAvailabilityResponse {
    fn rejected(_meta: &RequestMeta, result: ResponseResult) -> Self {
        Self {
            status_info: Some(StatusInfo::from_result(&result)),
            result,
            status: ChangeAvailabilityStatus::Rejected,
            custom_data: None,
        }
    }

    fn result(&self) -> &ResponseResult {
        &self.result
    }
}
