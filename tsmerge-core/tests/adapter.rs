use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use tsmerge_core::events::{RawDocument, RawInput};
use tsmerge_core::model::config::AdapterConfig;
use tsmerge_core::model::entry::{ContentState, TextFlowTarget};
use tsmerge_core::model::locale::LocaleId;
use tsmerge_core::parsers::qt_ts::TsWriter;
use tsmerge_core::services::adapter::{ParserOptions, QtTsAdapter};
use tsmerge_core::services::id::derive_id;
use tsmerge_core::AdapterError;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn locale(tag: &str) -> LocaleId {
    tag.parse().unwrap()
}

fn options(name: &str) -> ParserOptions {
    ParserOptions {
        raw_file: RawInput::Path(fixture(name)),
        locale: locale("en"),
        name: name.to_string(),
    }
}

fn target(state: ContentState, contents: &[&str]) -> TextFlowTarget {
    let mut tft = TextFlowTarget::new("", state);
    tft.contents = contents.iter().map(|s| s.to_string()).collect();
    tft
}

fn translations(entries: Vec<(&str, &str, TextFlowTarget)>) -> HashMap<String, TextFlowTarget> {
    entries
        .into_iter()
        .map(|(context, source, mut tft)| {
            let id = derive_id(context, source, "");
            tft.res_id = id.clone();
            (id, tft)
        })
        .collect()
}

fn generate(
    translations: &HashMap<String, TextFlowTarget>,
    tag: &str,
    approved_only: bool,
) -> String {
    let adapter = QtTsAdapter::default();
    let mut writer = TsWriter::new(Vec::new(), locale(tag));
    adapter
        .generate_translated_file(
            &RawInput::Path(fixture("sample.ts")),
            translations,
            &locale(tag),
            &mut writer,
            approved_only,
        )
        .unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
fn parses_source_document() {
    let doc = QtTsAdapter::default()
        .parse_document_file(&options("sample.ts"))
        .unwrap();

    let summary: Vec<(Option<&str>, &str, bool)> = doc
        .text_flows
        .iter()
        .map(|tf| (tf.extensions.context(), tf.contents[0].as_str(), tf.plural))
        .collect();

    assert_eq!(
        summary,
        vec![
            (Some("MainWindow"), "&Open", false),
            (Some("MainWindow"), "Close", false),
            (Some("MainWindow"), "%n file(s) selected", true),
            (Some("SettingsDialog"), "Close", false),
        ]
    );

    assert_eq!(doc.text_flows[0].id, derive_id("MainWindow", "&Open", ""));
    assert_eq!(
        doc.text_flows[0].extensions.comment(),
        Some("Opens an existing project")
    );
    assert_eq!(doc.text_flows[1].extensions.comment(), None);
    assert_eq!(doc.text_flows[3].extensions.comment(), Some("Dialog button"));
    assert_ne!(doc.text_flows[1].id, doc.text_flows[3].id);
    assert_eq!(doc.text_flows[2].contents.len(), 2);
}

#[test]
fn parses_existing_translations() {
    let raw = RawDocument::new(
        RawInput::Path(fixture("translated_de.ts")),
        "UTF-8",
        locale("en"),
    );
    let res = QtTsAdapter::default().parse_translation_file(&raw).unwrap();

    assert_eq!(res.text_flow_targets.len(), 3);
    let open = res.target(&derive_id("MainWindow", "&Open", "")).unwrap();
    assert_eq!(open.contents, vec!["&Öffnen"]);
    assert_eq!(open.state, ContentState::Translated);

    let plural = res
        .target(&derive_id("MainWindow", "%n file(s) selected", ""))
        .unwrap();
    assert_eq!(
        plural.contents,
        vec!["%n Datei ausgewählt", "%n Dateien ausgewählt"]
    );

    let close = res.target(&derive_id("MainWindow", "Close", "")).unwrap();
    assert_eq!(close.contents, vec!["Schließen"]);
}

#[test]
fn generates_translated_document() {
    let translations = translations(vec![
        ("MainWindow", "&Open", target(ContentState::Approved, &["&Öffnen"])),
        ("MainWindow", "Close", target(ContentState::Approved, &["Schließen"])),
        (
            "MainWindow",
            "%n file(s) selected",
            target(
                ContentState::Approved,
                &["%n Datei ausgewählt", "%n Dateien ausgewählt"],
            ),
        ),
        ("SettingsDialog", "Close", target(ContentState::Translated, &["Schließen"])),
    ]);

    let out = generate(&translations, "de_DE", true);

    assert!(out.contains(r#"<TS version="2.1" language="de-DE" sourcelanguage="en">"#));
    assert!(out.contains("<translation>&amp;Öffnen</translation>"));
    assert!(out.contains(
        "<translation><numerusform>%n Datei ausgewählt</numerusform>\
         <numerusform>%n Dateien ausgewählt</numerusform></translation>"
    ));
    assert_eq!(out.matches("<translation>Schließen</translation>").count(), 1);

    // second occurrence of the same id is left alone
    assert!(out.contains(
        "line=\"120\"/>\n        <source>Close</source>\n        \
         <translation type=\"unfinished\"></translation>"
    ));
    // translated but not approved, with approved-only output
    assert!(out.contains(
        "<comment>Dialog button</comment>\n        <translation type=\"unfinished\"></translation>"
    ));
}

#[test]
fn unapproved_translations_are_marked_unfinished() {
    let translations = translations(vec![(
        "SettingsDialog",
        "Close",
        target(ContentState::Translated, &["Schließen"]),
    )]);

    let out = generate(&translations, "de", false);
    assert!(out.contains(
        "<comment>Dialog button</comment>\n        \
         <translation type=\"unfinished\">Schließen</translation>"
    ));
}

#[test]
fn untranslated_output_only_changes_language() {
    let original = fs::read_to_string(fixture("sample.ts")).unwrap();
    let out = generate(&HashMap::new(), "fr", false);
    assert_eq!(out, original.replace(r#" language="en_US""#, r#" language="fr""#));
}

#[test]
fn generated_file_reads_back() {
    let translations = translations(vec![(
        "MainWindow",
        "&Open",
        target(ContentState::Approved, &["&Ouvrir"]),
    )]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample_fr.ts");

    let file = fs::File::create(&path).unwrap();
    let mut writer = TsWriter::new(file, locale("fr"));
    QtTsAdapter::default()
        .generate_translated_file(
            &RawInput::Path(fixture("sample.ts")),
            &translations,
            &locale("fr"),
            &mut writer,
            false,
        )
        .unwrap();
    drop(writer);

    let raw = RawDocument::new(RawInput::Path(path), "UTF-8", locale("en"));
    let res = QtTsAdapter::default().parse_translation_file(&raw).unwrap();
    let open = res.target(&derive_id("MainWindow", "&Open", "")).unwrap();
    assert_eq!(open.contents, vec!["&Ouvrir"]);
}

#[test]
fn missing_input_is_an_io_failure() {
    let err = QtTsAdapter::default()
        .parse_document_file(&options("does-not-exist.ts"))
        .unwrap_err();
    assert!(matches!(err, AdapterError::Io { .. }));
    assert!(err.to_string().starts_with("Unable to parse document"));
}

#[test]
fn empty_targets_can_be_ignored() {
    let config = AdapterConfig {
        allow_empty_targets: false,
        ..AdapterConfig::default()
    };
    let raw = RawDocument::new(RawInput::Path(fixture("sample.ts")), "UTF-8", locale("en"));

    let kept = QtTsAdapter::default().parse_translation_file(&raw).unwrap();
    let ignored = QtTsAdapter::new(config).parse_translation_file(&raw).unwrap();
    assert_ne!(kept, ignored);

    // duplicate "Close" in MainWindow accumulates into the first target
    assert_eq!(kept.text_flow_targets.len(), 4);
    let close = kept.target(&derive_id("MainWindow", "Close", "")).unwrap();
    assert_eq!(close.contents, vec!["", ""]);

    // every translation in the fixture is empty
    assert!(ignored.text_flow_targets.is_empty());
}
