use serde::{Deserialize, Serialize};

use super::extension::ExtensionSet;

/// A single translatable source entry of a document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TextFlow {
    pub id: String,

    #[serde(default)]
    pub lang: String,

    /// Singular content, followed by the plural form when `plural` is set.
    #[serde(default)]
    pub contents: Vec<String>,

    #[serde(default)]
    pub plural: bool,

    #[serde(default, skip_serializing_if = "ExtensionSet::is_empty")]
    pub extensions: ExtensionSet,
}

impl TextFlow {
    pub fn new(id: impl Into<String>, lang: impl Into<String>) -> Self {
        TextFlow {
            id: id.into(),
            lang: lang.into(),
            contents: Vec::new(),
            plural: false,
            extensions: ExtensionSet::default(),
        }
    }

    pub fn set_contents<I, S>(&mut self, contents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contents = contents.into_iter().map(Into::into).collect();
    }
}

/// A translation of a [`TextFlow`], keyed by the same derived id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TextFlowTarget {
    pub res_id: String,

    #[serde(default)]
    pub state: ContentState,

    #[serde(default)]
    pub contents: Vec<String>,
}

impl TextFlowTarget {
    pub fn new(res_id: impl Into<String>, state: ContentState) -> Self {
        TextFlowTarget {
            res_id: res_id.into(),
            state,
            contents: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    New,
    NeedReview,
    Translated,
    Approved,
    Rejected,
}

impl ContentState {
    pub fn is_translated(self) -> bool {
        self == ContentState::Translated
    }

    pub fn is_approved(self) -> bool {
        self == ContentState::Approved
    }
}

impl Default for ContentState {
    fn default() -> Self {
        ContentState::New
    }
}
