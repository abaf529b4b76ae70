use serde::{Deserialize, Serialize};

/// Metadata attached to a text flow.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Extension {
    /// Name of the context group the entry was found in.
    ContextHeader { context: String },
    Comment { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    ContextHeader,
    Comment,
}

impl Extension {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            Extension::ContextHeader { .. } => ExtensionKind::ContextHeader,
            Extension::Comment { .. } => ExtensionKind::Comment,
        }
    }
}

/// Ordered extensions, holding at most one record of each kind.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ExtensionSet(Vec<Extension>);

impl ExtensionSet {
    /// Adds `ext` unless a record of the same kind is already present.
    /// Returns whether it was added.
    pub fn add(&mut self, ext: Extension) -> bool {
        if self.find(ext.kind()).is_some() {
            return false;
        }
        self.0.push(ext);
        true
    }

    pub fn find(&self, kind: ExtensionKind) -> Option<&Extension> {
        self.0.iter().find(|e| e.kind() == kind)
    }

    pub fn context(&self) -> Option<&str> {
        match self.find(ExtensionKind::ContextHeader) {
            Some(Extension::ContextHeader { context }) => Some(context),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self.find(ExtensionKind::Comment) {
            Some(Extension::Comment { text }) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_record_of_same_kind_is_ignored() {
        let mut set = ExtensionSet::default();
        assert!(set.add(Extension::Comment { text: "a".into() }));
        assert!(set.add(Extension::ContextHeader { context: "Ctx".into() }));
        assert!(!set.add(Extension::Comment { text: "b".into() }));

        assert_eq!(set.len(), 2);
        assert_eq!(set.comment(), Some("a"));
        assert_eq!(set.context(), Some("Ctx"));
        assert_eq!(set.iter().next().map(Extension::kind), Some(ExtensionKind::Comment));
    }
}
