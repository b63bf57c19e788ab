//! Message decode / serialize vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use serde_json::json;

use ocppnet_core::message::{
    BootNotificationRequest, CertificateSignedRequest, ChangeAvailabilityRequest,
    ClearCacheRequest, CustomParsers, CustomSerializers, DataTransferRequest, OcppRequest,
    OcppResponse, ResetRequest, SignCertificateRequest, ToJson,
};
use ocppnet_core::protocol::{
    Action, NetworkPath, NetworkingNodeId, RequestEnvelope, RequestId, RequestMeta,
};

mod vector_loader;
use vector_loader::MessageVector;

fn meta() -> RequestMeta {
    RequestMeta::received(
        RequestId::new("msg-1"),
        NetworkingNodeId::new("CSMS"),
        NetworkPath::from_source(NetworkingNodeId::new("CS-01")),
        Duration::from_secs(30),
    )
}

fn check<Req: OcppRequest>(v: &MessageVector) {
    let env = RequestEnvelope::new(meta(), v.payload.clone());
    let res = Req::try_parse(&env, &CustomParsers::new());

    if let Some(expect) = &v.expect_error {
        let err = res.expect_err(&v.description);
        assert_eq!(err.error_code().as_str(), expect.code, "vector={}", v.description);
        if let Some(needle) = &expect.mentions {
            assert!(
                err.to_string().contains(needle.as_str()),
                "vector={} error={err}",
                v.description
            );
        }
        return;
    }

    let req = res.unwrap_or_else(|e| panic!("vector={} error={e}", v.description));
    assert_eq!(req.request_id(), &RequestId::new("msg-1"));

    // Default serializers reproduce the wire payload exactly.
    let json = req.to_json(&CustomSerializers::new());
    assert_eq!(json, v.payload, "vector={}", v.description);

    // decode(serialize(r)) == r
    let again = Req::try_parse(&RequestEnvelope::new(req.meta().clone(), json), &CustomParsers::new())
        .unwrap();
    assert_eq!(again, req, "vector={}", v.description);
}

fn check_response<Resp: OcppResponse>(v: &MessageVector) {
    let res = Resp::try_parse(&v.payload);

    if let Some(expect) = &v.expect_error {
        let err = res.expect_err(&v.description);
        assert_eq!(err.error_code().as_str(), expect.code, "vector={}", v.description);
        if let Some(needle) = &expect.mentions {
            assert!(
                err.to_string().contains(needle.as_str()),
                "vector={} error={err}",
                v.description
            );
        }
        return;
    }

    let resp = res.unwrap_or_else(|e| panic!("vector={} error={e}", v.description));

    let json = resp.to_json(&CustomSerializers::new());
    assert_eq!(json, v.payload, "vector={}", v.description);
    assert_eq!(resp.to_json(&CustomSerializers::new()), json, "vector={}", v.description);

    let again: Resp = serde_json::from_value(json).unwrap();
    assert_eq!(again, resp, "vector={}", v.description);
}

/// Pick the request or response check for `Req`.
fn check_either<Req: OcppRequest>(v: &MessageVector) {
    if v.response {
        check_response::<Req::Response>(v)
    } else {
        check::<Req>(v)
    }
}

fn run(name: &str) {
    let v = vector_loader::load(name);
    match v.action.parse::<Action>().unwrap() {
        Action::BootNotification => check_either::<BootNotificationRequest>(&v),
        Action::SignCertificate => check_either::<SignCertificateRequest>(&v),
        Action::CertificateSigned => check_either::<CertificateSignedRequest>(&v),
        Action::Reset => check_either::<ResetRequest>(&v),
        Action::ChangeAvailability => check_either::<ChangeAvailabilityRequest>(&v),
        Action::ClearCache => check_either::<ClearCacheRequest>(&v),
        Action::DataTransfer => check_either::<DataTransferRequest>(&v),
    }
}

#[test]
fn message_vectors() {
    let files = [
        "sign_certificate_ok.json",
        "sign_certificate_missing_csr.json",
        "sign_certificate_csr_wrong_type.json",
        "boot_notification_ok.json",
        "boot_notification_bad_reason.json",
        "boot_notification_model_too_long.json",
        "certificate_signed_ok.json",
        "data_transfer_ok.json",
        "data_transfer_unknown_field.json",
        "data_transfer_null_data.json",
        "reset_ok.json",
        "reset_negative_evse.json",
        "change_availability_ok.json",
        "clear_cache_ok.json",
        "boot_notification_response_ok.json",
        "boot_notification_response_bad_status.json",
        "sign_certificate_response_ok.json",
        "certificate_signed_response_ok.json",
        "data_transfer_response_null_data.json",
        "reset_response_scheduled.json",
        "change_availability_response_ok.json",
        "clear_cache_response_rejected.json",
    ];

    for f in files {
        run(f);
    }
}

#[test]
fn payload_must_be_object() {
    let env = RequestEnvelope::new(meta(), json!(["csr"]));
    let err = SignCertificateRequest::try_parse(&env, &CustomParsers::new()).unwrap_err();
    assert_eq!(err.error_code().as_str(), "FormatViolation");
}

#[test]
fn nested_serializer_override_is_honoured() {
    let v = vector_loader::load("boot_notification_ok.json");
    let env = RequestEnvelope::new(meta(), v.payload);
    let req = BootNotificationRequest::try_parse(&env, &CustomParsers::new()).unwrap();

    let s = CustomSerializers::new()
        .with::<ocppnet_core::message::boot_notification::ChargingStation, _>(|cs, mut json| {
            json["model"] = json!(cs.model.to_lowercase());
            json
        });
    let json = req.to_json(&s);

    assert_eq!(json["chargingStation"]["model"], "ek-300");
    assert_eq!(json["reason"], "PowerUp");

    // Same input, same output.
    assert_eq!(req.to_json(&s), json);
}

#[test]
fn custom_parser_runs_before_validation() {
    let env = RequestEnvelope::new(meta(), json!({ "vendorId": "  org.example  " }));
    let parsers = CustomParsers::new().with::<DataTransferRequest, _>(|_, mut req| {
        req.vendor_id = req.vendor_id.trim().to_string();
        req
    });
    let req = DataTransferRequest::try_parse(&env, &parsers).unwrap();
    assert_eq!(req.vendor_id, "org.example");
}

#[test]
fn null_data_is_kept_apart_from_absent_data() {
    let parse = |payload| {
        DataTransferRequest::try_parse(&RequestEnvelope::new(meta(), payload), &CustomParsers::new())
            .unwrap()
    };

    let explicit = parse(json!({ "vendorId": "v", "data": null }));
    assert_eq!(explicit.data, Some(None));
    assert_eq!(
        explicit.to_json(&CustomSerializers::new()),
        json!({ "vendorId": "v", "data": null })
    );

    let absent = parse(json!({ "vendorId": "v" }));
    assert_eq!(absent.data, None);
    assert_eq!(absent.to_json(&CustomSerializers::new()), json!({ "vendorId": "v" }));
}
