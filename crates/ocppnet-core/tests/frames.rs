//! OCPP-J frame parsing tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use ocppnet_core::error::OcppNetError;
use ocppnet_core::protocol::OcppFrame;
use ocppnet_core::ErrorCode;

#[test]
fn parse_call() {
    let f = OcppFrame::parse(r#"[2, "19223201", "SignCertificate", {"csr": "abc"}]"#).unwrap();
    match f {
        OcppFrame::Call { message_id, action, payload } => {
            assert_eq!(message_id, "19223201");
            assert_eq!(action, "SignCertificate");
            assert_eq!(payload, json!({ "csr": "abc" }));
        }
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[test]
fn parse_call_error_and_render_back() {
    let text = r#"[4,"a1","NotImplemented","no such action",{}]"#;
    let f = OcppFrame::parse(text).unwrap();
    assert_eq!(
        f,
        OcppFrame::call_error("a1", ErrorCode::NotImplemented, "no such action")
    );
    assert_eq!(f.to_value(), serde_json::from_str::<serde_json::Value>(text).unwrap());
}

#[test]
fn bad_frames_keep_message_id_when_readable() {
    let cases = [
        (r#"[2, "m1", "Reset"]"#, Some("m1")),
        (r#"[2, "m2", 7, {}]"#, Some("m2")),
        (r#"[2, "m3", "Reset", "not-an-object"]"#, Some("m3")),
        (r#"[9, "m4", {}]"#, Some("m4")),
        (r#"{"not": "an array"}"#, None),
        (r#"[2, 17, "Reset", {}]"#, None),
        ("not json", None),
    ];

    for (text, id) in cases {
        match OcppFrame::parse(text) {
            Err(OcppNetError::Frame { message_id, .. }) => {
                assert_eq!(message_id.as_deref(), id, "frame={text}")
            }
            other => panic!("frame={text} unexpected: {other:?}"),
        }
    }
}

#[test]
fn message_id_longer_than_36_is_rejected() {
    let id = "x".repeat(37);
    let text = json!([2, id, "Reset", {}]).to_string();
    let err = OcppFrame::parse(&text).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::RpcFrameworkError);
}
