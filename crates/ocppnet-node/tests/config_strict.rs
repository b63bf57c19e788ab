#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use ocppnet_core::error::{ErrorCode, OcppNetError};
use ocppnet_core::protocol::Action;
use ocppnet_node::config;
use ocppnet_node::forwarding::ForwardingResult;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
node:
  id: "NN-1"
  request_timeout: 30000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(matches!(err, OcppNetError::BadConfig(_)));
    assert_eq!(err.error_code(), ErrorCode::GenericError);
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
node:
  id: "NN-1"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.node.id, "NN-1");
    assert_eq!(cfg.node.upstream, "CSMS");
    assert_eq!(cfg.node.default_forwarding, ForwardingResult::Forward);
    assert_eq!(cfg.node.request_timeout_ms, 30000);
    assert!(cfg.forwarding.rules.is_empty());
    assert_eq!(cfg.forwarding.actions().unwrap(), Action::ALL.to_vec());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
node:
  id: "NN-1"
  upstream: "CSMS-EU"
  default_forwarding: reject
  request_timeout_ms: 5000
forwarding:
  rules: ["Reset:reject", "DataTransfer:drop", "*:forward"]
  messages: [Reset, DataTransfer, Reset]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.node.default_forwarding, ForwardingResult::Reject);
    assert_eq!(cfg.node.request_timeout().as_millis(), 5000);
    assert_eq!(
        cfg.forwarding.actions().unwrap(),
        vec![Action::Reset, Action::DataTransfer]
    );
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\nnode:\n  id: \"NN-1\"\n").expect_err("must fail");
    assert!(matches!(err, OcppNetError::UnsupportedVersion));
}

#[test]
fn values_are_range_checked() {
    let cases = [
        "version: 1\nnode:\n  id: \"\"\n",
        "version: 1\nnode:\n  id: \"0123456789012345678901234567890123456\"\n",
        "version: 1\nnode:\n  id: \"NN-1\"\n  request_timeout_ms: 10\n",
        "version: 1\nnode:\n  id: \"NN-1\"\n  default_forwarding: maybe\n",
        "version: 1\nnode:\n  id: \"NN-1\"\nforwarding:\n  rules: [\"Reset\"]\n",
        "version: 1\nnode:\n  id: \"NN-1\"\nforwarding:\n  rules: [\"Reset:reject\", \"Reset:forward\"]\n",
        "version: 1\nnode:\n  id: \"NN-1\"\nforwarding:\n  messages: [Heartbeat]\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert!(matches!(err, OcppNetError::BadConfig(_)), "{yaml}: {err}");
    }
}

#[test]
fn missing_file_is_reported() {
    let err = config::load_from_file("/nonexistent/ocppnet.yaml").expect_err("must fail");
    assert!(err.to_string().contains("read config failed"));
}
