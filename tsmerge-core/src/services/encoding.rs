use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

use crate::error::{AdapterError, Result};

pub const AUTO: &str = "auto";

#[derive(Debug, Serialize)]
pub struct EncodingCandidate {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct EncodingDetectionResult {
    pub best: String,
    pub confidence: f32,
    pub candidates: Vec<EncodingCandidate>,
}

pub fn detect_from_file(path: &Path) -> Result<EncodingDetectionResult> {
    let bytes = fs::read(path)
        .map_err(|e| AdapterError::io(format!("failed to read {}", path.display()), e))?;
    Ok(detect(&bytes))
}

pub fn detect(bytes: &[u8]) -> EncodingDetectionResult {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        let best = encoding.name().to_lowercase();
        return EncodingDetectionResult {
            best: best.clone(),
            confidence: 0.99,
            candidates: vec![EncodingCandidate {
                name: best,
                confidence: 0.99,
            }],
        };
    }

    let encoding = guess(bytes);
    let best = encoding.name().to_lowercase();
    let confidence = estimate_confidence(bytes, encoding);

    let mut candidates = vec![EncodingCandidate {
        name: best.clone(),
        confidence,
    }];

    // TS files are XML; anything ASCII-compatible that decodes cleanly is
    // usually UTF-8 mislabelled by the detector.
    if best != "utf-8" && !UTF_8.decode_without_bom_handling(bytes).1 {
        candidates.push(EncodingCandidate {
            name: "utf-8".into(),
            confidence: (confidence - 0.05).max(0.0),
        });
    }

    EncodingDetectionResult {
        best,
        confidence,
        candidates,
    }
}

/// Decodes raw input. A BOM always wins over `label`; `auto` runs detection.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = if label.trim().eq_ignore_ascii_case(AUTO) {
        Encoding::for_bom(bytes)
            .map(|(e, _)| e)
            .unwrap_or_else(|| guess(bytes))
    } else {
        Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| AdapterError::Config(format!("unknown encoding '{label}'")))?
    };

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!(
            "input is not valid {}, malformed sequences were replaced",
            encoding.name()
        );
    }
    Ok(text.into_owned())
}

fn guess(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn estimate_confidence(bytes: &[u8], encoding: &'static Encoding) -> f32 {
    let (text, _, had_errors) = encoding.decode(bytes);

    if had_errors {
        return 0.35;
    }

    let len = text.len();
    if len < 64 {
        0.55
    } else if len < 512 {
        0.70
    } else if len < 4096 {
        0.82
    } else {
        0.90
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_overrides_declared_label() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<TS>é</TS>".as_bytes());
        assert_eq!(decode(&bytes, "windows-1252").unwrap(), "<TS>é</TS>");
    }

    #[test]
    fn declared_label_is_used() {
        let bytes = [b'<', b'a', b'>', 0xE9, b'<', b'/', b'a', b'>'];
        assert_eq!(decode(&bytes, "ISO-8859-1").unwrap(), "<a>é</a>");
    }

    #[test]
    fn unknown_label_is_a_config_error() {
        assert!(matches!(
            decode(b"x", "no-such-charset"),
            Err(AdapterError::Config(_))
        ));
    }

    #[test]
    fn auto_detects_utf8() {
        let text = "<message><source>Größe ändern</source></message>".repeat(8);
        assert_eq!(decode(text.as_bytes(), AUTO).unwrap(), text);
        assert_eq!(detect(text.as_bytes()).best, "utf-8");
    }
}
