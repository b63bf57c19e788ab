//! JSON test vector loader shared by message tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MessageVector {
    pub description: String,
    pub action: String,
    /// `true` when `payload` is the response of `action` rather than the request.
    #[serde(default)]
    pub response: bool,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
    /// Substring the error text must contain (usually the field name).
    #[serde(default)]
    pub mentions: Option<String>,
}

pub fn load(name: &str) -> MessageVector {
    let path = format!("{}/tests/vectors/{name}", env!("CARGO_MANIFEST_DIR"));
    let s = fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"));
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("parse {path}: {e}"))
}
