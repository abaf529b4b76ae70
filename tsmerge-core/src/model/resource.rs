use serde::{Deserialize, Serialize};

use super::entry::{TextFlow, TextFlowTarget};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "text/plain")]
    TextPlain,
}

/// A parsed source document.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Resource {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub lang: String,

    #[serde(default)]
    pub content_type: ContentType,

    #[serde(default)]
    pub text_flows: Vec<TextFlow>,
}

impl Resource {
    pub fn new(lang: impl Into<String>) -> Self {
        Resource {
            lang: lang.into(),
            ..Resource::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TranslationsResource {
    #[serde(default)]
    pub text_flow_targets: Vec<TextFlowTarget>,
}

impl TranslationsResource {
    pub fn target(&self, res_id: &str) -> Option<&TextFlowTarget> {
        self.text_flow_targets.iter().find(|t| t.res_id == res_id)
    }
}
