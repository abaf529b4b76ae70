use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Correlation key of a text unit: context immediately followed by content.
pub fn id_key(context: &str, content: &str) -> String {
    let mut key = String::with_capacity(context.len() + content.len());
    key.push_str(context);
    key.push_str(content);
    key
}

pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derived id of a text unit, shared by parsing and generation.
pub fn derive_id(context: &str, content: &str, sub_doc_name: &str) -> String {
    let hash = hash_key(&id_key(context, content));
    if sub_doc_name.is_empty() {
        hash
    } else {
        format!("{sub_doc_name}:{hash}")
    }
}

/// Ids seen so far in one invocation, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct IdSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl IdSet {
    pub fn new() -> Self {
        IdSet::default()
    }

    /// Returns false if `id` was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
