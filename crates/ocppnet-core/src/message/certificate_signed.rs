//! CertificateSigned (CSMS -> charging station): delivers the signed chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{
    check_max_len, put_child, validate_custom_data, CertificateSigningUse, GenericStatus,
};
use super::{
    CustomData, CustomSerializers, OcppRequest, OcppResponse, ResponseResult, StatusInfo, ToJson,
};
use crate::error::Result;
use crate::protocol::{Action, RequestMeta};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CertificateSignedRequest {
    #[serde(skip)]
    pub meta: RequestMeta,
    /// PEM encoded certificate chain, leaf first.
    pub certificate_chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_type: Option<CertificateSigningUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for CertificateSignedRequest {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppRequest for CertificateSignedRequest {
    const ACTION: Action = Action::CertificateSigned;
    type Response = CertificateSignedResponse;

    fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RequestMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<()> {
        check_max_len(Self::ACTION, "certificateChain", &self.certificate_chain, 10000)?;
        validate_custom_data(Self::ACTION, self.custom_data.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CertificateSignedResponse {
    #[serde(skip)]
    pub result: ResponseResult,
    pub status: GenericStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for CertificateSignedResponse {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "statusInfo", self.status_info.as_ref(), serializers);
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppResponse for CertificateSignedResponse {
    fn rejected(_meta: &RequestMeta, result: ResponseResult) -> Self {
        Self {
            status_info: Some(StatusInfo::from_result(&result)),
            result,
            status: GenericStatus::Rejected,
            custom_data: None,
        }
    }

    fn result(&self) -> &ResponseResult {
        &self.result
    }
}
