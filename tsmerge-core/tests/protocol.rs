use serde_json::{json, Value};

use tsmerge_core::model::config::AdapterConfig;
use tsmerge_core::protocol::handle;
use tsmerge_core::services::id::derive_id;

const TS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TS version="2.1" language="en_US" sourcelanguage="en">
<context>
    <name>Greeter</name>
    <message>
        <source>Hello</source>
        <translation type="unfinished"></translation>
    </message>
</context>
</TS>
"#;

fn call(request: Value) -> Value {
    let response = handle(&request.to_string(), &AdapterConfig::default());
    serde_json::from_str(&response).unwrap()
}

#[test]
fn ping() {
    let resp = call(json!({ "id": 1, "cmd": "ping" }));
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["status"], "ok");
}

#[test]
fn invalid_json_and_unknown_commands_are_errors() {
    let resp: Value =
        serde_json::from_str(&handle("{ nope", &AdapterConfig::default())).unwrap();
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "invalid json");

    let resp = call(json!({ "id": "x", "cmd": "frobnicate" }));
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "unknown command");
}

#[test]
fn parse_document_from_text() {
    let resp = call(json!({
        "id": 2,
        "cmd": "parse_document",
        "payload": { "text": TS, "locale": "en", "name": "greeter.ts" }
    }));

    assert_eq!(resp["status"], "ok", "{resp}");
    let flows = &resp["payload"]["document"]["text_flows"];
    assert_eq!(flows.as_array().unwrap().len(), 1);
    assert_eq!(flows[0]["id"], derive_id("Greeter", "Hello", ""));
    assert_eq!(flows[0]["contents"], json!(["Hello"]));
    assert_eq!(
        flows[0]["extensions"],
        json!([{ "type": "context_header", "context": "Greeter" }])
    );
    assert_eq!(resp["payload"]["document"]["content_type"], "text/plain");
}

#[test]
fn generate_translation_returns_text() {
    let id = derive_id("Greeter", "Hello", "");
    let resp = call(json!({
        "id": 3,
        "cmd": "generate_translation",
        "payload": {
            "text": TS,
            "locale": "pt_BR",
            "translations": [{ "res_id": id, "state": "Translated", "contents": ["Olá"] }]
        }
    }));

    assert_eq!(resp["status"], "ok", "{resp}");
    let text = resp["payload"]["text"].as_str().unwrap();
    assert!(text.contains(r#"language="pt-BR""#));
    assert!(text.contains(r#"<translation type="unfinished">Olá</translation>"#));
}

#[test]
fn approved_only_can_come_from_config() {
    let id = derive_id("Greeter", "Hello", "");
    let resp = call(json!({
        "id": 4,
        "cmd": "generate_translation",
        "payload": {
            "text": TS,
            "locale": "pt-BR",
            "config": { "approved_only": true },
            "translations": [{ "res_id": id, "state": "Translated", "contents": ["Olá"] }]
        }
    }));

    let text = resp["payload"]["text"].as_str().unwrap();
    assert!(!text.contains("Olá"));
}

#[test]
fn generate_translation_requires_a_valid_locale() {
    let resp = call(json!({
        "id": 5,
        "cmd": "generate_translation",
        "payload": { "text": TS, "translations": [] }
    }));
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "payload.locale is required");

    let resp = call(json!({
        "id": 6,
        "cmd": "generate_translation",
        "payload": { "text": TS, "locale": "not a locale", "translations": [] }
    }));
    assert_eq!(resp["status"], "error");
}

#[test]
fn generate_translation_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("greeter_de.ts");
    let resp = call(json!({
        "id": 7,
        "cmd": "generate_translation",
        "payload": {
            "text": TS,
            "locale": "de",
            "output_path": out.to_str().unwrap(),
            "translations": []
        }
    }));

    assert_eq!(resp["status"], "ok", "{resp}");
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains(r#"<TS version="2.1" language="de" sourcelanguage="en">"#));
}

#[test]
fn parse_translations_and_filename() {
    let resp = call(json!({
        "id": 8,
        "cmd": "parse_translations",
        "payload": { "text": TS }
    }));
    assert_eq!(resp["status"], "ok", "{resp}");
    let targets = &resp["payload"]["translations"]["text_flow_targets"];
    assert_eq!(targets[0]["state"], "Translated");
    assert_eq!(targets[0]["contents"], json!([""]));

    let resp = call(json!({
        "id": 9,
        "cmd": "translation_filename",
        "payload": { "name": "po/greeter.ts", "locale": "de" }
    }));
    assert_eq!(resp["payload"]["filename"], "po/greeter_de.ts");
}
