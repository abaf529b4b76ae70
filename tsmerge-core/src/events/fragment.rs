use once_cell::sync::Lazy;
use regex::Regex;

/// Letter-coded placeholder for the n-th (1-based) inline code of a fragment.
static LETTER_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<x(\d+)/>").unwrap());

/// Raw inline markup kept opaque inside translatable text, e.g. `<byte value="x7"/>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Code(Code),
}

/// Translatable text interleaved with inline codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFragment {
    segments: Vec<Segment>,
}

impl TextFragment {
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut fragment = TextFragment::default();
        fragment.append_text(&text.into());
        fragment
    }

    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    pub fn append_code(&mut self, data: impl Into<String>) {
        self.segments.push(Segment::Code(Code { data: data.into() }));
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &Code> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Code(c) => Some(c),
            Segment::Text(_) => None,
        })
    }

    /// Text with each inline code replaced by its `<xN/>` placeholder.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut n = 0;
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Code(_) => {
                    n += 1;
                    out.push_str(&format!("<x{n}/>"));
                }
            }
        }
        out
    }

    /// Builds a fragment from letter-coded `translated` text, reusing this
    /// fragment's codes for the placeholders it references. Placeholders with
    /// no matching code stay literal text; codes that are not referenced are
    /// dropped.
    pub fn with_text(&self, translated: &str) -> TextFragment {
        let codes: Vec<&Code> = self.codes().collect();
        let mut out = TextFragment::default();
        let mut last = 0;

        for caps in LETTER_CODE.captures_iter(translated) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let code = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| codes.get(i));

            if let Some(code) = code {
                out.append_text(&translated[last..whole.start()]);
                out.append_code(code.data.clone());
                last = whole.end();
            }
        }
        out.append_text(&translated[last..]);
        out
    }

    /// XML rendering: text escaped, codes written back verbatim.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(&quick_xml::escape::escape(t.as_str())),
                Segment::Code(c) => out.push_str(&c.data),
            }
        }
        out
    }
}
