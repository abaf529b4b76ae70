use std::io::Write;

use crate::error::{AdapterError, Result};
use crate::events::{Event, EventSink, TextUnit};
use crate::model::locale::LocaleId;

/// Serializes events back into a `.ts` file for one output locale.
///
/// Skeleton text is written as-is. Text units whose target for the output
/// locale was rewritten get a freshly rendered `<translation>` element.
pub struct TsWriter<W: Write> {
    out: W,
    locale: LocaleId,
}

impl<W: Write> TsWriter<W> {
    pub fn new(out: W, locale: LocaleId) -> Self {
        TsWriter { out, locale }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|e| AdapterError::io("failed to write translated document", e))
    }
}

fn render_translation(unit: &TextUnit, locale: &LocaleId) -> String {
    let mut out = String::from("<translation");
    if unit.target_property(locale, "approved") == Some("no") {
        out.push_str(r#" type="unfinished""#);
    }
    out.push('>');

    let fragments = unit
        .target(locale)
        .map(|t| t.fragments().to_vec())
        .unwrap_or_default();

    if unit.is_numerus() {
        for form in &fragments {
            out.push_str("<numerusform>");
            out.push_str(&form.to_xml());
            out.push_str("</numerusform>");
        }
    } else if let Some(last) = fragments.last() {
        out.push_str(&last.to_xml());
    }

    out.push_str("</translation>");
    out
}

/// Renders a unit for `locale`, splicing a new translation into its skeleton
/// when the target was rewritten.
pub fn render_unit(unit: &TextUnit, locale: &LocaleId) -> String {
    if unit.is_target_rewritten(locale) {
        unit.skeleton.splice_target(&render_translation(unit, locale))
    } else {
        unit.skeleton.raw.clone()
    }
}

impl<W: Write> EventSink for TsWriter<W> {
    fn handle_event(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::TextUnit(unit) => {
                let rendered = render_unit(unit, &self.locale);
                self.write(&rendered)
            }
            Event::DocumentPart(part) => match &part.skeleton {
                Some(skeleton) => self.write(skeleton),
                None => Err(AdapterError::UnexpectedResource(
                    "document part without skeleton".into(),
                )),
            },
            other => self.write(other.skeleton()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| AdapterError::io("failed to flush translated document", e))
    }
}
