use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AdapterError;

/// A parsed locale tag such as `en`, `pt_BR` or `sr-Latn-RS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocaleId {
    language: String,
    script: Option<String>,
    region: Option<String>,
    variants: Vec<String>,
}

impl LocaleId {
    /// The "no locale" value, rendered as an empty string.
    pub fn empty() -> Self {
        LocaleId::default()
    }

    pub fn is_empty(&self) -> bool {
        self.language.is_empty()
    }

    /// Canonical `lang[-Script][-REGION][-variant]` form.
    pub fn to_bcp47(&self) -> String {
        let mut out = self.language.clone();
        for part in self
            .script
            .iter()
            .chain(self.region.iter())
            .chain(self.variants.iter())
        {
            out.push('-');
            out.push_str(part);
        }
        out
    }
}

fn script_for_modifier(modifier: &str) -> Option<&'static str> {
    match modifier.to_ascii_lowercase().as_str() {
        "latin" => Some("Latn"),
        "cyrillic" => Some("Cyrl"),
        "devanagari" => Some("Deva"),
        _ => None,
    }
}

fn title_case(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl FromStr for LocaleId {
    type Err = AdapterError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let invalid = || AdapterError::InvalidLocale(format!("'{tag}'"));

        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let (base, modifier) = match trimmed.split_once('@') {
            Some((b, m)) => (b, Some(m)),
            None => (trimmed, None),
        };

        let mut parts = base.split(['-', '_']);
        let language = parts.next().unwrap_or("");
        let lang_ok = matches!(language.len(), 2..=3 | 5..=8)
            && language.chars().all(|c| c.is_ascii_alphabetic());
        if !lang_ok {
            return Err(invalid());
        }

        let mut locale = LocaleId {
            language: language.to_ascii_lowercase(),
            ..LocaleId::default()
        };

        for part in parts {
            let alpha = part.chars().all(|c| c.is_ascii_alphabetic());
            let digits = part.chars().all(|c| c.is_ascii_digit());
            let alnum = part.chars().all(|c| c.is_ascii_alphanumeric());

            if part.len() == 4 && alpha && locale.script.is_none() && locale.region.is_none() {
                locale.script = Some(title_case(part));
            } else if ((part.len() == 2 && alpha) || (part.len() == 3 && digits))
                && locale.region.is_none()
                && locale.variants.is_empty()
            {
                locale.region = Some(part.to_ascii_uppercase());
            } else if alnum && (5..=8).contains(&part.len()) {
                locale.variants.push(part.to_ascii_lowercase());
            } else {
                return Err(invalid());
            }
        }

        if let Some(modifier) = modifier {
            match script_for_modifier(modifier) {
                Some(script) if locale.script.is_none() => locale.script = Some(script.to_string()),
                _ => return Err(invalid()),
            }
        }

        Ok(locale)
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bcp47())
    }
}

impl Serialize for LocaleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bcp47())
    }
}

impl<'de> Deserialize<'de> for LocaleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(LocaleId::empty());
        }
        s.parse().map_err(serde::de::Error::custom)
    }
}
