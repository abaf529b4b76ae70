//! Line-oriented JSON protocol: one request object per line in, one
//! response object per line out.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use log::debug;
use serde_json::{json, Value};

use crate::events::{RawDocument, RawInput};
use crate::model::config::AdapterConfig;
use crate::model::entry::TextFlowTarget;
use crate::model::locale::LocaleId;
use crate::parsers::qt_ts::TsWriter;
use crate::services::adapter::{translation_filename, ParserOptions, QtTsAdapter};
use crate::services::encoding;

mod command;
pub use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn get_str<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

/// `base` with any fields of `payload.config` laid over it.
fn request_config(payload: &Value, base: &AdapterConfig) -> Result<AdapterConfig, String> {
    let Some(overrides) = payload.get("config").and_then(|v| v.as_object()) else {
        return Ok(base.clone());
    };

    let mut merged = serde_json::to_value(base).map_err(|e| e.to_string())?;
    if let Some(fields) = merged.as_object_mut() {
        for (k, v) in overrides {
            fields.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(merged).map_err(|e| format!("invalid payload.config: {e}"))
}

fn raw_input(payload: &Value) -> Result<RawInput, String> {
    let path = get_str(payload, "path");
    if !path.is_empty() {
        return Ok(RawInput::Path(PathBuf::from(path)));
    }
    match payload.get("text").and_then(|v| v.as_str()) {
        Some(text) => Ok(RawInput::Text(text.to_string())),
        None => Err("payload.path or payload.text is required".into()),
    }
}

fn parse_locale(payload: &Value, key: &str) -> Result<Option<LocaleId>, String> {
    let tag = get_str(payload, key);
    if tag.is_empty() {
        return Ok(None);
    }
    tag.parse()
        .map(Some)
        .map_err(|e| format!("payload.{key}: {e}"))
}

fn parse_translations_from_payload(payload: &Value) -> Result<HashMap<String, TextFlowTarget>, String> {
    let arr = payload
        .get("translations")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "payload.translations must be an array".to_string())?;

    let mut translations = HashMap::with_capacity(arr.len());
    for (i, v) in arr.iter().cloned().enumerate() {
        match serde_json::from_value::<TextFlowTarget>(v) {
            Ok(t) => {
                translations.insert(t.res_id.clone(), t);
            }
            Err(e) => return Err(format!("invalid translation at index {}: {}", i, e)),
        }
    }

    Ok(translations)
}

fn parse_document(payload: &Value, config: AdapterConfig) -> Result<Value, String> {
    let raw_file = raw_input(payload)?;
    let locale = match parse_locale(payload, "locale")? {
        Some(l) => l,
        None => config
            .default_source_locale
            .parse()
            .map_err(|e| format!("config.default_source_locale: {e}"))?,
    };
    let name = get_str(payload, "name").to_string();

    let adapter = QtTsAdapter::new(config);
    let document = adapter
        .parse_document_file(&ParserOptions { raw_file, locale, name })
        .map_err(|e| e.to_string())?;
    Ok(json!({ "document": document }))
}

fn parse_translations(payload: &Value, config: AdapterConfig) -> Result<Value, String> {
    let mut raw_doc = RawDocument::new(
        raw_input(payload)?,
        config.encoding.clone(),
        LocaleId::empty(),
    );
    raw_doc.target_locale = parse_locale(payload, "locale")?;

    let adapter = QtTsAdapter::new(config);
    let translations = adapter
        .parse_translation_file(&raw_doc)
        .map_err(|e| e.to_string())?;
    Ok(json!({ "translations": translations }))
}

fn generate_translation(payload: &Value, config: AdapterConfig) -> Result<Value, String> {
    let original = raw_input(payload)?;
    let locale = parse_locale(payload, "locale")?.ok_or("payload.locale is required")?;
    let translations = parse_translations_from_payload(payload)?;
    let approved_only = payload
        .get("approved_only")
        .and_then(|v| v.as_bool())
        .unwrap_or(config.approved_only);

    let adapter = QtTsAdapter::new(config);
    let output_path = get_str(payload, "output_path");

    if output_path.is_empty() {
        let mut writer = TsWriter::new(Vec::new(), locale.clone());
        adapter
            .generate_translated_file(&original, &translations, &locale, &mut writer, approved_only)
            .map_err(|e| e.to_string())?;
        let text = String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())?;
        return Ok(json!({ "text": text }));
    }

    let file = File::create(output_path).map_err(|e| format!("failed to create {output_path}: {e}"))?;
    let mut writer = TsWriter::new(BufWriter::new(file), locale.clone());
    adapter
        .generate_translated_file(&original, &translations, &locale, &mut writer, approved_only)
        .map_err(|e| e.to_string())?;
    Ok(json!({ "output_path": output_path }))
}

pub fn handle(input: &str, config: &AdapterConfig) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd = Command::from(get_cmd(&req));
    let payload = get_payload(&req);
    debug!("request {id}: {cmd:?}");

    let config = match request_config(payload, config) {
        Ok(c) => c,
        Err(e) => return err(id, e),
    };

    let result = match cmd {
        Command::Ping => Ok(json!({ "message": "tsmerge-core alive" })),
        Command::ParseDocument => parse_document(payload, config),
        Command::ParseTranslations => parse_translations(payload, config),
        Command::GenerateTranslation => generate_translation(payload, config),
        Command::TranslationFilename => {
            let name = get_str(payload, "name");
            let locale = get_str(payload, "locale");
            if name.is_empty() || locale.is_empty() {
                Err("payload.name and payload.locale are required".to_string())
            } else {
                Ok(json!({ "filename": translation_filename(name, locale) }))
            }
        }
        Command::DetectEncoding => {
            let path = get_str(payload, "path");
            if path.is_empty() {
                Err("payload.path is required".to_string())
            } else {
                encoding::detect_from_file(&PathBuf::from(path))
                    .map(|r| serde_json::to_value(r).unwrap_or(json!({})))
                    .map_err(|e| e.to_string())
            }
        }
        Command::Unknown => Err("unknown command".to_string()),
    };

    match result {
        Ok(payload) => ok(id, payload),
        Err(message) => err(id, message),
    }
}
