//! Structural events exchanged between a format filter, the adapter and a writer.
//!
//! A filter turns raw bytes into an ordered stream of [`Event`]s, each keeping
//! the raw skeleton text it was cut from, so a writer can put the file back
//! together after the adapter has mutated some of them.

mod fragment;
mod stream;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;

pub use fragment::{Code, TextFragment};
pub use stream::{
    CollectingSink, EventSink, EventSource, OpenSource, RawDocument, RawInput, SinkGuard,
    VecSource,
};

use crate::model::locale::LocaleId;

pub type Properties = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    DocumentPart(DocumentPart),
    StartGroup(StartGroup),
    EndGroup(EndGroup),
    TextUnit(TextUnit),
    /// Skeleton text with no structure of interest.
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    DocumentPart,
    StartGroup,
    EndGroup,
    TextUnit,
    Other,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::DocumentPart => "DOCUMENT_PART",
            EventType::StartGroup => "START_GROUP",
            EventType::EndGroup => "END_GROUP",
            EventType::TextUnit => "TEXT_UNIT",
            EventType::Other => "OTHER",
        };
        f.write_str(name)
    }
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::DocumentPart(_) => EventType::DocumentPart,
            Event::StartGroup(_) => EventType::StartGroup,
            Event::EndGroup(_) => EventType::EndGroup,
            Event::TextUnit(_) => EventType::TextUnit,
            Event::Other(_) => EventType::Other,
        }
    }

    /// Raw text this event was produced from.
    pub fn skeleton(&self) -> &str {
        match self {
            Event::DocumentPart(p) => p.skeleton.as_deref().unwrap_or(""),
            Event::StartGroup(g) => &g.skeleton,
            Event::EndGroup(g) => &g.skeleton,
            Event::TextUnit(tu) => &tu.skeleton.raw,
            Event::Other(s) => s,
        }
    }
}

/// Non-translatable document structure, such as a file header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPart {
    /// `None` when the producing filter attached no textual skeleton.
    pub skeleton: Option<String>,
    pub properties: Properties,
}

impl DocumentPart {
    pub fn new(skeleton: impl Into<String>) -> Self {
        DocumentPart {
            skeleton: Some(skeleton.into()),
            properties: Properties::new(),
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartGroup {
    /// Structured group name, when the filter could read one.
    pub name: Option<String>,
    pub skeleton: String,
}

impl fmt::Display for StartGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.skeleton)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndGroup {
    pub skeleton: String,
}

impl fmt::Display for EndGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.skeleton)
    }
}

/// One or more fragments; plural translations carry one fragment per form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextContainer {
    fragments: Vec<TextFragment>,
}

impl TextContainer {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        TextContainer { fragments }
    }

    pub fn first_content(&self) -> TextFragment {
        self.fragments.first().cloned().unwrap_or_default()
    }

    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(TextFragment::is_empty)
    }
}

impl From<TextFragment> for TextContainer {
    fn from(fragment: TextFragment) -> Self {
        TextContainer {
            fragments: vec![fragment],
        }
    }
}

/// Raw text of a unit plus where its translation element sits in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSkeleton {
    pub raw: String,
    /// Byte range of the original translation element, if there was one.
    pub target_span: Option<Range<usize>>,
    /// Where a translation element goes when there was none.
    pub insert_at: usize,
}

impl UnitSkeleton {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let insert_at = raw.len();
        UnitSkeleton {
            raw,
            target_span: None,
            insert_at,
        }
    }

    /// Replaces the translation element (or inserts one) with `element`.
    pub fn splice_target(&self, element: &str) -> String {
        let range = self
            .target_span
            .clone()
            .unwrap_or(self.insert_at..self.insert_at);
        let mut out = String::with_capacity(self.raw.len() + element.len());
        out.push_str(&self.raw[..range.start]);
        out.push_str(element);
        out.push_str(&self.raw[range.end..]);
        out
    }
}

impl fmt::Display for UnitSkeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub id: String,
    pub translatable: bool,
    pub source: TextContainer,
    pub properties: Properties,
    pub skeleton: UnitSkeleton,
    targets: BTreeMap<String, TextContainer>,
    target_properties: BTreeMap<String, Properties>,
    rewritten: BTreeSet<String>,
}

impl TextUnit {
    pub fn new(id: impl Into<String>, source: impl Into<TextContainer>) -> Self {
        TextUnit {
            id: id.into(),
            translatable: true,
            source: source.into(),
            properties: Properties::new(),
            skeleton: UnitSkeleton::default(),
            targets: BTreeMap::new(),
            target_properties: BTreeMap::new(),
            rewritten: BTreeSet::new(),
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Whether the unit carries `numerus="yes"`.
    pub fn is_numerus(&self) -> bool {
        self.property("numerus")
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"))
    }

    pub fn target(&self, locale: &LocaleId) -> Option<&TextContainer> {
        self.targets.get(&locale.to_bcp47())
    }

    /// Records a target read from the raw input; not treated as a rewrite.
    pub fn load_target(&mut self, locale: &LocaleId, content: TextContainer) {
        self.targets.insert(locale.to_bcp47(), content);
    }

    /// Replaces the target for `locale` and marks it for re-rendering.
    pub fn set_target_content(&mut self, locale: &LocaleId, content: TextContainer) {
        let key = locale.to_bcp47();
        self.targets.insert(key.clone(), content);
        self.rewritten.insert(key);
    }

    pub fn is_target_rewritten(&self, locale: &LocaleId) -> bool {
        self.rewritten.contains(&locale.to_bcp47())
    }

    pub fn target_property(&self, locale: &LocaleId, name: &str) -> Option<&str> {
        self.target_properties
            .get(&locale.to_bcp47())
            .and_then(|p| p.get(name))
            .map(String::as_str)
    }

    pub fn set_target_property(&mut self, locale: &LocaleId, name: &str, value: impl Into<String>) {
        self.target_properties
            .entry(locale.to_bcp47())
            .or_default()
            .insert(name.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_replaces_span_or_inserts() {
        let raw = "<message><source>a</source><translation>x</translation></message>";
        let start = raw.find("<translation>").unwrap();
        let end = raw.find("</message>").unwrap();
        let mut skel = UnitSkeleton::new(raw);
        skel.insert_at = end;
        skel.target_span = Some(start..end);
        assert_eq!(
            skel.splice_target("<translation>y</translation>"),
            "<message><source>a</source><translation>y</translation></message>"
        );

        skel.target_span = None;
        assert_eq!(
            skel.splice_target("<t/>"),
            "<message><source>a</source><translation>x</translation><t/></message>"
        );
    }

    #[test]
    fn loaded_targets_are_not_rewrites() {
        let fr: LocaleId = "fr".parse().unwrap();
        let mut tu = TextUnit::new("tu1", TextFragment::from_text("Hello"));
        tu.load_target(&fr, TextFragment::from_text("Bonjour").into());
        assert!(!tu.is_target_rewritten(&fr));

        tu.set_target_content(&fr, TextFragment::from_text("Salut").into());
        assert!(tu.is_target_rewritten(&fr));
        assert_eq!(tu.target(&fr).unwrap().first_content().text(), "Salut");
    }

    #[test]
    fn numerus_property_is_case_insensitive() {
        let mut tu = TextUnit::new("tu1", TextFragment::from_text("%n files"));
        assert!(!tu.is_numerus());
        tu.properties.insert("numerus".into(), "YES".into());
        assert!(tu.is_numerus());
    }
}
