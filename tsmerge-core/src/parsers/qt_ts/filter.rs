use std::collections::VecDeque;

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;

use crate::error::{AdapterError, Result};
use crate::events::{
    DocumentPart, EndGroup, Event, EventSource, Properties, RawDocument, StartGroup,
    TextContainer, TextFragment, TextUnit, UnitSkeleton,
};
use crate::model::locale::LocaleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsParameters {
    /// Report an empty `<translation>` as an (empty) target.
    pub allow_empty_targets: bool,
}

impl Default for TsParameters {
    fn default() -> Self {
        TsParameters {
            allow_empty_targets: true,
        }
    }
}

/// Event source for Qt Linguist `.ts` files.
///
/// The whole document is tokenized on `open`; events are then handed out
/// one at a time.
#[derive(Debug, Default)]
pub struct TsFilter {
    params: TsParameters,
    events: VecDeque<Event>,
}

impl TsFilter {
    pub fn new(params: TsParameters) -> Self {
        TsFilter {
            params,
            events: VecDeque::new(),
        }
    }

    pub fn parameters_mut(&mut self) -> &mut TsParameters {
        &mut self.params
    }
}

impl EventSource for TsFilter {
    fn open(&mut self, doc: &RawDocument) -> Result<()> {
        let text = doc.read_text()?;
        let target = doc.target_locale.clone().filter(|l| !l.is_empty());
        let events = Tokenizer::new(&text, target, self.params).run()?;
        self.events = events.into();
        Ok(())
    }

    fn next_event(&mut self) -> Option<Result<Event>> {
        self.events.pop_front().map(Ok)
    }

    fn close(&mut self) {
        self.events.clear();
    }
}

struct ContextHeader {
    skeleton: String,
    name: Option<String>,
}

struct Tokenizer<'a> {
    text: &'a str,
    reader: Reader<&'a [u8]>,
    params: TsParameters,
    /// Locale translations are filed under; from the caller or the `<TS>` tag.
    target: Option<LocaleId>,
    pending: String,
    header: Option<ContextHeader>,
    events: Vec<Event>,
    units: usize,
}

fn attr(tag: &BytesStart, name: &str) -> Result<Option<String>> {
    match tag.try_get_attribute(name) {
        Ok(Some(a)) => a
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|e| parse_error(0, e)),
        Ok(None) => Ok(None),
        Err(e) => Err(parse_error(0, e)),
    }
}

fn parse_error(position: usize, e: impl std::fmt::Display) -> AdapterError {
    AdapterError::Parse {
        position,
        message: e.to_string(),
    }
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str, target: Option<LocaleId>, params: TsParameters) -> Self {
        Tokenizer {
            text,
            reader: Reader::from_str(text),
            params,
            target,
            pending: String::new(),
            header: None,
            events: Vec::new(),
            units: 0,
        }
    }

    fn next(&mut self) -> Result<(XmlEvent<'a>, &'a str)> {
        let start = self.reader.buffer_position() as usize;
        let event = self
            .reader
            .read_event()
            .map_err(|e| parse_error(self.reader.error_position() as usize, e))?;
        let end = self.reader.buffer_position() as usize;
        Ok((event, &self.text[start..end]))
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            self.events.push(Event::Other(std::mem::take(&mut self.pending)));
        }
    }

    fn run(mut self) -> Result<Vec<Event>> {
        loop {
            let (event, raw) = self.next()?;

            if self.header.is_some() && self.extend_header(&event, raw)? {
                continue;
            }

            match event {
                XmlEvent::Start(tag) if tag.name().as_ref() == b"TS" => {
                    self.pending.push_str(raw);
                    let part = self.document_part(&tag)?;
                    self.events.push(Event::DocumentPart(part));
                }
                XmlEvent::Start(tag) if tag.name().as_ref() == b"context" => {
                    self.flush_pending();
                    self.header = Some(ContextHeader {
                        skeleton: raw.to_string(),
                        name: None,
                    });
                }
                XmlEvent::End(tag) if tag.name().as_ref() == b"context" => {
                    self.flush_pending();
                    self.events.push(Event::EndGroup(EndGroup {
                        skeleton: raw.to_string(),
                    }));
                }
                XmlEvent::Start(tag) if tag.name().as_ref() == b"message" => {
                    self.flush_pending();
                    let unit = self.read_message(&tag, raw)?;
                    self.events.push(Event::TextUnit(unit));
                }
                XmlEvent::Eof => {
                    self.flush_pending();
                    return Ok(self.events);
                }
                _ => self.pending.push_str(raw),
            }
        }
    }

    /// Grows the open context header; returns false once the header is
    /// complete, after emitting it.
    fn extend_header(&mut self, event: &XmlEvent<'a>, raw: &str) -> Result<bool> {
        let Some(header) = self.header.as_mut() else {
            return Ok(false);
        };

        match event {
            XmlEvent::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {
                header.skeleton.push_str(raw);
                Ok(true)
            }
            XmlEvent::Comment(_) => {
                header.skeleton.push_str(raw);
                Ok(true)
            }
            XmlEvent::Start(tag) if tag.name().as_ref() == b"name" && header.name.is_none() => {
                header.skeleton.push_str(raw);
                let (fragment, rest) = self.read_fragment(b"name")?;
                if let Some(header) = self.header.as_mut() {
                    header.skeleton.push_str(&rest);
                    header.name = Some(fragment.text());
                }
                Ok(true)
            }
            _ => {
                if let Some(header) = self.header.take() {
                    self.events.push(Event::StartGroup(StartGroup {
                        name: header.name,
                        skeleton: header.skeleton,
                    }));
                }
                Ok(false)
            }
        }
    }

    fn document_part(&mut self, tag: &BytesStart) -> Result<DocumentPart> {
        let mut properties = Properties::new();
        for name in ["version", "language", "sourcelanguage"] {
            if let Some(value) = attr(tag, name)? {
                properties.insert(name.to_string(), value);
            }
        }

        if self.target.is_none() {
            self.target = properties
                .get("language")
                .and_then(|l| l.parse::<LocaleId>().ok());
        }

        Ok(DocumentPart {
            skeleton: Some(std::mem::take(&mut self.pending)),
            properties,
        })
    }

    /// Reads inline content up to the closing `tag`, returning it with the
    /// raw text consumed (closing tag included).
    fn read_fragment(&mut self, tag: &[u8]) -> Result<(TextFragment, String)> {
        let mut fragment = TextFragment::default();
        let mut consumed = String::new();
        let mut depth = 0usize;

        loop {
            let position = self.reader.buffer_position() as usize;
            let (event, raw) = self.next()?;
            consumed.push_str(raw);

            match event {
                XmlEvent::Text(t) => {
                    let text = t.unescape().map_err(|e| parse_error(position, e))?;
                    fragment.append_text(&text);
                }
                XmlEvent::CData(c) => fragment.append_text(&String::from_utf8_lossy(&c)),
                XmlEvent::Empty(_) => fragment.append_code(raw),
                XmlEvent::Start(_) => {
                    depth += 1;
                    fragment.append_code(raw);
                }
                XmlEvent::End(e) if depth == 0 && e.name().as_ref() == tag => {
                    return Ok((fragment, consumed));
                }
                XmlEvent::End(_) => {
                    depth = depth.saturating_sub(1);
                    fragment.append_code(raw);
                }
                XmlEvent::Eof => {
                    return Err(parse_error(
                        position,
                        format!("unterminated <{}>", String::from_utf8_lossy(tag)),
                    ))
                }
                _ => {}
            }
        }
    }

    fn read_translation(&mut self) -> Result<(Vec<TextFragment>, String)> {
        let mut direct = TextFragment::default();
        let mut forms = Vec::new();
        let mut consumed = String::new();

        loop {
            let position = self.reader.buffer_position() as usize;
            let (event, raw) = self.next()?;
            consumed.push_str(raw);

            match event {
                XmlEvent::Start(tag) if tag.name().as_ref() == b"numerusform" => {
                    let (form, rest) = self.read_fragment(b"numerusform")?;
                    consumed.push_str(&rest);
                    forms.push(form);
                }
                XmlEvent::Empty(tag) if tag.name().as_ref() == b"numerusform" => {
                    forms.push(TextFragment::default());
                }
                XmlEvent::Text(t) => {
                    let text = t.unescape().map_err(|e| parse_error(position, e))?;
                    direct.append_text(&text);
                }
                XmlEvent::CData(c) => direct.append_text(&String::from_utf8_lossy(&c)),
                XmlEvent::Empty(_) => direct.append_code(raw),
                XmlEvent::End(tag) if tag.name().as_ref() == b"translation" => break,
                XmlEvent::Eof => return Err(parse_error(position, "unterminated <translation>")),
                _ => {}
            }
        }

        if forms.is_empty() {
            forms.push(direct);
        }
        Ok((forms, consumed))
    }

    fn read_message(&mut self, open: &BytesStart, raw: &str) -> Result<TextUnit> {
        self.units += 1;
        let mut skeleton = UnitSkeleton::new(raw);
        let mut unit = TextUnit::new(format!("tu{}", self.units), TextFragment::default());
        if let Some(numerus) = attr(open, "numerus")? {
            unit.properties.insert("numerus".into(), numerus);
        }

        loop {
            let position = self.reader.buffer_position() as usize;
            let (event, raw) = self.next()?;

            match event {
                XmlEvent::Start(tag) if tag.name().as_ref() == b"source" => {
                    skeleton.raw.push_str(raw);
                    let (fragment, rest) = self.read_fragment(b"source")?;
                    skeleton.raw.push_str(&rest);
                    unit.source = fragment.into();
                }
                XmlEvent::Start(tag) if tag.name().as_ref() == b"translation" => {
                    let start = skeleton.raw.len();
                    skeleton.raw.push_str(raw);
                    let kind = attr(&tag, "type")?;
                    let (forms, rest) = self.read_translation()?;
                    skeleton.raw.push_str(&rest);
                    skeleton.target_span = Some(start..skeleton.raw.len());
                    self.file_target(&mut unit, kind.as_deref(), forms);
                }
                XmlEvent::Empty(tag) if tag.name().as_ref() == b"translation" => {
                    let start = skeleton.raw.len();
                    skeleton.raw.push_str(raw);
                    skeleton.target_span = Some(start..skeleton.raw.len());
                    let kind = attr(&tag, "type")?;
                    self.file_target(&mut unit, kind.as_deref(), vec![TextFragment::default()]);
                }
                XmlEvent::End(tag) if tag.name().as_ref() == b"message" => {
                    skeleton.insert_at = skeleton.raw.len();
                    skeleton.raw.push_str(raw);
                    unit.skeleton = skeleton;
                    return Ok(unit);
                }
                XmlEvent::Eof => return Err(parse_error(position, "unterminated <message>")),
                _ => skeleton.raw.push_str(raw),
            }
        }
    }

    fn file_target(&self, unit: &mut TextUnit, kind: Option<&str>, forms: Vec<TextFragment>) {
        if matches!(kind, Some("obsolete") | Some("vanished")) {
            unit.translatable = false;
        }

        let Some(locale) = &self.target else {
            return;
        };

        let content = TextContainer::new(forms);
        if content.is_empty() && !self.params.allow_empty_targets {
            return;
        }

        unit.load_target(locale, content);
        let approved = if kind == Some("unfinished") { "no" } else { "yes" };
        unit.set_target_property(locale, "approved", approved);
    }
}
