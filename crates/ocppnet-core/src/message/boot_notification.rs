//! BootNotification (charging station -> CSMS).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{check_max_len, put_child, validate_custom_data};
use super::{
    CustomData, CustomSerializers, OcppRequest, OcppResponse, ResponseResult, StatusInfo, ToJson,
};
use crate::error::Result;
use crate::protocol::{Action, RequestMeta};

/// Why the charging station (re)booted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootReason {
    ApplicationReset,
    FirmwareUpdate,
    LocalReset,
    PowerUp,
    RemoteReset,
    ScheduledReset,
    Triggered,
    Unknown,
    Watchdog,
}

/// Registration state returned by the CSMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Accepted,
    Pending,
    Rejected,
}

/// Identity of the booting charging station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChargingStation {
    pub model: String,
    pub vendor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for ChargingStation {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BootNotificationRequest {
    #[serde(skip)]
    pub meta: RequestMeta,
    pub charging_station: ChargingStation,
    pub reason: BootReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for BootNotificationRequest {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "chargingStation", Some(&self.charging_station), serializers);
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppRequest for BootNotificationRequest {
    const ACTION: Action = Action::BootNotification;
    type Response = BootNotificationResponse;

    fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RequestMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<()> {
        let cs = &self.charging_station;
        check_max_len(Self::ACTION, "chargingStation.model", &cs.model, 20)?;
        check_max_len(Self::ACTION, "chargingStation.vendorName", &cs.vendor_name, 50)?;
        if let Some(sn) = &cs.serial_number {
            check_max_len(Self::ACTION, "chargingStation.serialNumber", sn, 25)?;
        }
        if let Some(fw) = &cs.firmware_version {
            check_max_len(Self::ACTION, "chargingStation.firmwareVersion", fw, 50)?;
        }
        validate_custom_data(Self::ACTION, cs.custom_data.as_ref())?;
        validate_custom_data(Self::ACTION, self.custom_data.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BootNotificationResponse {
    #[serde(skip)]
    pub result: ResponseResult,
    pub current_time: DateTime<Utc>,
    /// Heartbeat interval in seconds (retry interval when not accepted).
    pub interval: i32,
    pub status: RegistrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ToJson for BootNotificationResponse {
    fn children_to_json(&self, json: &mut Value, serializers: &CustomSerializers) {
        put_child(json, "statusInfo", self.status_info.as_ref(), serializers);
        put_child(json, "customData", self.custom_data.as_ref(), serializers);
    }
}

impl OcppResponse for BootNotificationResponse {
    fn rejected(_meta: &RequestMeta, result: ResponseResult) -> Self {
        Self {
            status_info: Some(StatusInfo::from_result(&result)),
            result,
            current_time: Utc::now(),
            interval: 0,
            status: RegistrationStatus::Rejected,
            custom_data: None,
        }
    }

    fn result(&self) -> &ResponseResult {
        &self.result
    }
}
