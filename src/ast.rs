//! Abstract syntax tree produced by the parser.
//!
//! These are passive data carriers: the parser fills them in and the brain
//! (`RiveScript::parse_merge`) consumes them. Nothing here validates itself.

use std::collections::{BTreeSet, HashMap};

/// Root of a parsed RiveScript document.
#[derive(Debug, Clone, Default)]
pub struct Root {
    pub begin: Begin,
    pub topics: HashMap<String, Topic>,
    pub objects: Vec<ObjectMacro>,
}

impl Root {
    /// A fresh tree with the default `random` topic pre-created.
    pub fn new() -> Self {
        let mut root = Root::default();
        root.topics.insert("random".to_string(), Topic::default());
        root
    }

    pub(crate) fn topic_mut(&mut self, name: &str) -> &mut Topic {
        self.topics.entry(name.to_string()).or_default()
    }
}

/// The `> begin` data: definitions that apply to the whole brain.
#[derive(Debug, Clone, Default)]
pub struct Begin {
    pub global: HashMap<String, String>,
    pub var: HashMap<String, String>,
    pub sub: HashMap<String, String>,
    pub person: HashMap<String, String>,
    pub array: HashMap<String, Vec<String>>,
}

/// A named collection of triggers, with its topic-graph edges.
///
/// `includes` and `inherits` are ordered sets so that trigger collection is
/// deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct Topic {
    pub triggers: Vec<Trigger>,
    pub includes: BTreeSet<String>,
    pub inherits: BTreeSet<String>,
}

/// A trigger pattern and everything that can answer it.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    pub pattern: String,
    pub replies: Vec<String>,
    pub conditions: Vec<String>,
    pub redirect: Option<String>,
    /// The `%Previous` pattern, matched against the bot's last reply.
    pub previous: Option<String>,
}

impl Trigger {
    /// True if this trigger can produce any output at all.
    pub(crate) fn has_output(&self) -> bool {
        !self.replies.is_empty() || !self.conditions.is_empty() || self.redirect.is_some()
    }
}

/// An object macro block: `> object NAME LANG` ... `< object`.
#[derive(Debug, Clone)]
pub struct ObjectMacro {
    pub name: String,
    pub language: String,
    /// Body lines, verbatim.
    pub code: Vec<String>,
}
