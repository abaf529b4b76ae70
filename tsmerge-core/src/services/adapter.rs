//! Qt TS adapter: turns a `.ts` event stream into text flows and targets, and
//! merges translations back into a copy of the original file.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::error::{AdapterError, Result};
use crate::events::{
    DocumentPart, Event, EventSink, EventSource, OpenSource, RawDocument, RawInput, SinkGuard,
    TextContainer, TextUnit,
};
use crate::model::config::AdapterConfig;
use crate::model::entry::{ContentState, TextFlow, TextFlowTarget};
use crate::model::extension::Extension;
use crate::model::locale::LocaleId;
use crate::model::resource::{Resource, TranslationsResource};
use crate::parsers::qt_ts::{TsFilter, TsParameters};
use crate::services::comment::extract_comment;
use crate::services::context::{ContextDiagnostic, ContextScope};
use crate::services::id::{derive_id, IdSet};

static LANGUAGE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\slanguage\s*=\s*"[\w\d@.-]*""#).unwrap());

static BCP47: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());

pub type FilterFactory = Box<dyn Fn(&AdapterConfig) -> Box<dyn EventSource>>;

/// What to parse a source document from.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub raw_file: RawInput,
    pub locale: LocaleId,
    pub name: String,
}

pub struct QtTsAdapter {
    config: AdapterConfig,
    filter: FilterFactory,
}

fn ts_filter(config: &AdapterConfig) -> Box<dyn EventSource> {
    let mut filter = TsFilter::default();
    update_params_with_defaults(filter.parameters_mut(), config);
    Box::new(filter)
}

pub fn update_params_with_defaults(params: &mut TsParameters, config: &AdapterConfig) {
    params.allow_empty_targets = config.allow_empty_targets;
}

/// Prefixes the message of an I/O failure with what was being done.
fn while_doing(err: AdapterError, what: &str) -> AdapterError {
    match err {
        AdapterError::Io { message, source } => AdapterError::Io {
            message: format!("{what}: {message}"),
            source,
        },
        other => other,
    }
}

fn report(diagnostic: Option<ContextDiagnostic>) {
    if let Some(d) = diagnostic {
        info!("{d}");
    }
}

/// Text to translate, or `None` when the unit is skipped.
pub fn translatable_text(tu: &TextUnit) -> Option<String> {
    if tu.source.is_empty() || !tu.translatable {
        return None;
    }
    let content = tu.source.first_content().text();
    (!content.is_empty()).then_some(content)
}

/// Whether a translation in `state` may be written to an output file.
pub fn usable(state: ContentState, approved_only: bool) -> bool {
    state.is_approved() || (!approved_only && state.is_translated())
}

/// Rewrites every ` language="…"` in the part's skeleton to `locale`.
pub fn replace_locale_in_doc_part(part: &DocumentPart, locale: &LocaleId) -> Result<String> {
    let Some(skeleton) = part.skeleton.as_deref() else {
        error!(
            "Unexpected Qt TS event type: {}, in {:?}",
            crate::events::EventType::DocumentPart,
            part.properties
        );
        return Err(AdapterError::UnexpectedResource("Qt TS Adapter error".into()));
    };

    let tag = locale.to_bcp47();
    if !BCP47.is_match(&tag) {
        return Err(AdapterError::InvalidLocale(format!(
            "Invalid target locale '{tag}'"
        )));
    }

    let replacement = format!(r#" language="{tag}""#);
    Ok(LANGUAGE_ATTR
        .replace_all(skeleton, NoExpand(&replacement))
        .into_owned())
}

/// Output file name for a translated copy of `doc_name`.
pub fn translation_filename(doc_name: &str, locale: &str) -> String {
    let path = Path::new(doc_name);
    let is_ts = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ts"));

    if !is_ts {
        warn!("Adding missing TS extension to generated filename");
        return format!("{doc_name}_{locale}.ts");
    }

    let stem = &doc_name[..doc_name.len() - ".ts".len()];
    format!("{stem}_{locale}.ts")
}

impl QtTsAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        QtTsAdapter {
            config,
            filter: Box::new(ts_filter),
        }
    }

    /// Uses `factory` instead of the `.ts` tokenizer to produce events.
    pub fn with_filter<F>(config: AdapterConfig, factory: F) -> Self
    where
        F: Fn(&AdapterConfig) -> Box<dyn EventSource> + 'static,
    {
        QtTsAdapter {
            config,
            filter: Box::new(factory),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn raw_translation_upload_available(&self) -> bool {
        true
    }

    fn source_locale(&self) -> LocaleId {
        self.config
            .default_source_locale
            .parse()
            .unwrap_or_else(|_| LocaleId::empty())
    }

    pub fn parse_document_file(&self, options: &ParserOptions) -> Result<Resource> {
        let mut document = Resource::new(options.locale.to_bcp47());
        document.name = options.name.clone();

        let raw_doc = RawDocument::new(
            options.raw_file.clone(),
            self.config.encoding.clone(),
            self.source_locale(),
        )
        .with_target_locale(LocaleId::empty());

        let mut filter = (self.filter)(&self.config);
        let events = OpenSource::open(filter.as_mut(), &raw_doc)
            .map_err(|e| while_doing(e, "Unable to parse document"))?;

        let mut scope = ContextScope::Idle;
        let mut added = IdSet::new();

        for event in events {
            let event = event.map_err(|e| while_doing(e, "Unable to parse document"))?;

            if let Some(step) = scope.step(&event) {
                report(step.diagnostic);
                scope = step.scope;
                continue;
            }

            let Event::TextUnit(tu) = &event else {
                continue;
            };
            let Some(content) = translatable_text(tu) else {
                continue;
            };

            let id = derive_id(scope.name(), &content, &self.config.sub_doc_name);
            if added.contains(&id) {
                continue;
            }

            let mut tf = process_text_flow(tu, &id, &content, &options.locale);
            add_extensions(&mut tf, tu, scope.name());
            added.insert(&id);
            document.text_flows.push(tf);
        }

        debug!(
            "parsed {} text flows from {}",
            document.text_flows.len(),
            if document.name.is_empty() { "<unnamed>" } else { document.name.as_str() }
        );
        Ok(document)
    }

    pub fn parse_translation_file(&self, raw_doc: &RawDocument) -> Result<TranslationsResource> {
        let mut translations = TranslationsResource::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        let mut locale = raw_doc.target_locale.clone().filter(|l| !l.is_empty());

        let mut filter = (self.filter)(&self.config);
        let events = OpenSource::open(filter.as_mut(), raw_doc)
            .map_err(|e| while_doing(e, "Unable to parse translation file"))?;

        let mut scope = ContextScope::Idle;

        for event in events {
            let event = event.map_err(|e| while_doing(e, "Unable to parse translation file"))?;

            if let Some(step) = scope.step(&event) {
                report(step.diagnostic);
                scope = step.scope;
                continue;
            }

            match &event {
                Event::DocumentPart(part) if locale.is_none() => {
                    locale = part
                        .properties
                        .get("language")
                        .and_then(|l| l.parse().ok());
                }
                Event::TextUnit(tu) => {
                    let Some(content) = translatable_text(tu) else {
                        continue;
                    };
                    let translated = match translated_text(tu, locale.as_ref()) {
                        Some(translated) => translated,
                        None if self.config.allow_empty_targets => vec![String::new()],
                        None => continue,
                    };
                    let id = derive_id(scope.name(), &content, &self.config.sub_doc_name);

                    match index.get(&id) {
                        Some(&i) => translations.text_flow_targets[i]
                            .contents
                            .extend(translated),
                        None => {
                            let mut tft = TextFlowTarget::new(id.clone(), ContentState::Translated);
                            tft.contents = translated;
                            index.insert(id, translations.text_flow_targets.len());
                            translations.text_flow_targets.push(tft);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(translations)
    }

    /// Re-emits the original document to `writer`, merging in `translations`
    /// for `locale`. The writer is closed on every exit path.
    pub fn generate_translated_file(
        &self,
        original: &RawInput,
        translations: &HashMap<String, TextFlowTarget>,
        locale: &LocaleId,
        writer: &mut dyn EventSink,
        approved_only: bool,
    ) -> Result<()> {
        let raw_doc = RawDocument::new(
            original.clone(),
            self.config.encoding.clone(),
            self.source_locale(),
        )
        .with_target_locale(locale.clone());

        let mut sink = SinkGuard::new(writer);
        self.merge(&raw_doc, translations, locale, &mut sink, approved_only)
            .map_err(|e| while_doing(e, "Unable to generate translated document from original"))?;
        sink.finish()
    }

    fn merge(
        &self,
        raw_doc: &RawDocument,
        translations: &HashMap<String, TextFlowTarget>,
        locale: &LocaleId,
        sink: &mut SinkGuard<'_>,
        approved_only: bool,
    ) -> Result<()> {
        let mut filter = (self.filter)(&self.config);
        let events = OpenSource::open(filter.as_mut(), raw_doc)?;

        let mut scope = ContextScope::Idle;
        let mut encountered = IdSet::new();

        for event in events {
            let mut event = event?;

            if let Event::DocumentPart(part) = &mut event {
                if part.has_property("language") {
                    part.skeleton = Some(replace_locale_in_doc_part(part, locale)?);
                }
            } else if let Some(step) = scope.step(&event) {
                report(step.diagnostic);
                scope = step.scope;
            } else if let Event::TextUnit(tu) = &mut event {
                self.process_translation(
                    tu,
                    scope.name(),
                    locale,
                    translations,
                    &mut encountered,
                    approved_only,
                );
            }

            sink.handle(&event)?;
        }

        debug!("merged {} translations for {}", encountered.len(), locale);
        Ok(())
    }

    fn process_translation(
        &self,
        tu: &mut TextUnit,
        context: &str,
        locale: &LocaleId,
        translations: &HashMap<String, TextFlowTarget>,
        encountered: &mut IdSet,
        approved_only: bool,
    ) {
        let Some(translatable) = translatable_text(tu) else {
            return;
        };

        let id = derive_id(context, &translatable, &self.config.sub_doc_name);
        let Some(tft) = translations.get(&id) else {
            return;
        };

        // duplicate numerus forms
        if !encountered.insert(&id) {
            return;
        }

        if !usable(tft.state, approved_only) {
            return;
        }

        let approved = if tft.state.is_approved() { "yes" } else { "no" };
        let source = tu.source.first_content();
        let fragments = tft
            .contents
            .iter()
            .map(|translated| source.with_text(translated))
            .collect();

        tu.set_target_property(locale, "approved", approved);
        tu.set_target_content(locale, TextContainer::new(fragments));
    }
}

impl Default for QtTsAdapter {
    fn default() -> Self {
        QtTsAdapter::new(AdapterConfig::default())
    }
}

/// Builds the text flow for a unit; plural units repeat the source as their
/// plural form since the format has no separate plural source.
fn process_text_flow(tu: &TextUnit, id: &str, content: &str, locale: &LocaleId) -> TextFlow {
    let mut tf = TextFlow::new(id, locale.to_bcp47());
    if tu.is_numerus() {
        tf.plural = true;
        tf.set_contents([content, content]);
    } else {
        tf.plural = false;
        tf.set_contents([content]);
    }
    tf
}

fn add_extensions(tf: &mut TextFlow, tu: &TextUnit, context: &str) {
    if !context.trim().is_empty() {
        tf.extensions.add(Extension::ContextHeader {
            context: context.to_string(),
        });
    }
    if let Some(text) = extract_comment(&tu.skeleton.raw) {
        tf.extensions.add(Extension::Comment { text });
    }
}

/// Existing translation of a unit; every form for plural units.
fn translated_text(tu: &TextUnit, locale: Option<&LocaleId>) -> Option<Vec<String>> {
    let target = tu.target(locale?)?;
    if tu.is_numerus() && !target.fragments().is_empty() {
        Some(target.fragments().iter().map(|f| f.text()).collect())
    } else {
        Some(vec![target.first_content().text()])
    }
}
