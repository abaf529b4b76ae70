//! Tracks which `<context>` group the event stream is currently inside.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::events::{Event, StartGroup};

static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)<name>(.+)</name>").unwrap());

pub fn is_start_context(event: &Event) -> bool {
    matches!(event, Event::StartGroup(g) if g.skeleton.to_lowercase().contains("<context"))
}

pub fn is_end_context(event: &Event) -> bool {
    matches!(event, Event::EndGroup(g) if g.skeleton.to_lowercase().contains("</context"))
}

/// A value recovered from a known producer defect, with a note on how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered<T> {
    pub value: T,
    pub diagnostic: Option<ContextDiagnostic>,
}

/// The group carried no structured name; it was read from its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDiagnostic {
    pub recovered: String,
    pub skeleton: String,
}

impl fmt::Display for ContextDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Qt ts context bug encountered, returning {} from {}",
            self.recovered, self.skeleton
        )
    }
}

/// Name of a context group; empty when none can be found.
pub fn context_name(group: &StartGroup) -> Recovered<String> {
    if let Some(name) = &group.name {
        return Recovered {
            value: name.clone(),
            diagnostic: None,
        };
    }

    match NAME.captures(&group.skeleton) {
        Some(caps) => {
            let recovered = caps[1].to_string();
            Recovered {
                diagnostic: Some(ContextDiagnostic {
                    recovered: recovered.clone(),
                    skeleton: group.skeleton.clone(),
                }),
                value: recovered,
            }
        }
        None => Recovered {
            value: String::new(),
            diagnostic: None,
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContextScope {
    #[default]
    Idle,
    InContext(String),
}

/// Result of feeding a context boundary to a [`ContextScope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub scope: ContextScope,
    pub diagnostic: Option<ContextDiagnostic>,
}

impl ContextScope {
    fn open(name: String) -> Self {
        if name.is_empty() {
            ContextScope::Idle
        } else {
            ContextScope::InContext(name)
        }
    }

    /// Current context name, `""` outside any context.
    pub fn name(&self) -> &str {
        match self {
            ContextScope::Idle => "",
            ContextScope::InContext(name) => name,
        }
    }

    /// The scope after `event`, or `None` if it is not a context boundary.
    ///
    /// Contexts do not nest: an open while another is open replaces it.
    pub fn step(&self, event: &Event) -> Option<Step> {
        match event {
            Event::StartGroup(group) if is_start_context(event) => {
                let name = context_name(group);
                Some(Step {
                    scope: ContextScope::open(name.value),
                    diagnostic: name.diagnostic,
                })
            }
            Event::EndGroup(_) if is_end_context(event) => Some(Step {
                scope: ContextScope::Idle,
                diagnostic: None,
            }),
            _ => None,
        }
    }
}
