//! DataTransfer (either direction): vendor specific payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{check_max_len, put_child, present_or_null, validate_custom_data};
use super::{
    CustomData, CustomSerializers, OcppRequest, OcppResponse, ResponseResult, StatusInfo, ToJson,
};
use crate::error::Result;
use crate::protocol::{Action, RequestMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataTransferStatus {
    Accepted,
    Rejected,
    UnknownMessageId,
    UnknownVendorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DataTransferRequest {
    #[serde(skip)]
    pub meta: RequestMeta,
    pub vendor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Arbitrary vendor data, opaque to the node. `Some(None)` is an explicit `null`.
    #[serde(default, deserialize_with = "present_or_null", skip_serializing_if = "Option::is_none")]
    pub data: Option<Option<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for DataTransferRequest {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppRequest for DataTransferRequest {
    const ACTION: Action = Action::DataTransfer;
    type Response = DataTransferResponse;

    fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RequestMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<()> {
        check_max_len(Self::ACTION, "vendorId", &self.vendor_id, 255)?;
        if let Some(id) = &self.message_id {
            check_max_len(Self::ACTION, "messageId", id, 50)?;
        }
        validate_custom_data(Self::ACTION, self.custom_data.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DataTransferResponse {
    #[serde(skip)]
    pub result: ResponseResult,
    pub status: DataTransferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(default, deserialize_with = "present_or_null", skip_serializing_if = "Option::is_none")]
    pub data: Option<Option<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for DataTransferResponse {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "statusInfo", self.status_info.as_ref(), serializers);
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppResponse for DataTransferResponse {
    fn rejected(_meta: &RequestMeta, result: ResponseResult) -> Self {
        Self {
            status_info: Some(StatusInfo::from_result(&result)),
            result,
            status: DataTransferStatus::Rejected,
            data: None,
            custom_data: None,
        }
    }

    fn result(&self) -> &ResponseResult {
        &self.result
    }
}
