//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{Value, json};

/// Write `<uuid>-result.json` into `dir`.
pub fn write_result(dir: &Path, uuid: &str, body: Value) {
    let path = dir.join(format!("{uuid}-result.json"));
    fs::write(path, serde_json::to_string_pretty(&body).unwrap()).unwrap();
}

pub fn result(uuid: &str, name: &str, status: &str) -> Value {
    json!({
        "uuid": uuid,
        "name": name,
        "status": status,
        "start": 1_700_000_000_000_i64,
        "stop": 1_700_000_001_500_i64,
        "labels": [
            {"name": "suite", "value": "test_sanity_video_player"},
            {"name": "subSuite", "value": "TestPlayback"}
        ]
    })
}

pub fn failed_result(uuid: &str, name: &str, message: &str) -> Value {
    let mut body = result(uuid, name, "failed");
    body["statusDetails"] = json!({ "message": message, "trace": "Traceback (most recent call last):" });
    body
}
