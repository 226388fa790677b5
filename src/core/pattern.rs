//! The declarative pattern data model.
//!
//! A [`Rule`] is the unit of configuration for one category: an optional
//! preprocessing step, an `input` section describing what to pull out of the
//! document, and an `output` section describing how to assemble messages from
//! what was pulled out.
//!
//! These types deserialize straight off the collaborator-provided pattern
//! snapshot (category name → [`Rule`]) with permissive `Option`/default
//! fields — malformed *shape* (e.g. a prune directive with neither `first`
//! nor `all`) is not rejected here but at evaluation time, matching the
//! unknown-transform-name behavior in `crate::core::transform`: a pattern set
//! that happens to contain a category no one asks to extract should never
//! fail to load.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A full pattern set: category name → [`Rule`].
pub type PatternSet = IndexMap<String, Rule>;

/// One category's extraction rule.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub preprocess: Vec<PruneDirective>,
    #[serde(default)]
    pub input: IndexMap<String, InputGroup>,
    #[serde(default)]
    pub output: IndexMap<String, OutputSchema>,
}

/// A single `prune` directive: remove the first match of a selector, or all
/// matches. Exactly one of `first`/`all` must be set; both absent or both
/// present is a permanent error, raised when the directive is run (see
/// `crate::core::preprocess`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneDirective {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<String>,
}

/// The resolved shape of a [`PruneDirective`], produced on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneKind {
    First(String),
    All(String),
}

/// An `input` section entry: either a `first`-type group (at most one root
/// match) or an `all`-type group (zero or more root matches, yielding
/// parallel arrays).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<IndexMap<String, SelectorDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<IndexMap<String, SelectorDef>>,
}

/// The resolved shape of an [`InputGroup`].
#[derive(Debug, Clone)]
pub enum InputGroupKind<'a> {
    First(&'a IndexMap<String, SelectorDef>),
    All(&'a IndexMap<String, SelectorDef>),
}

impl InputGroup {
    /// Resolves which of `first`/`all` this group uses. A permanent error if
    /// neither (or, ambiguously, both) is set.
    pub fn kind(&self) -> Result<InputGroupKind<'_>, crate::error::CoreError> {
        match (&self.first, &self.all) {
            (Some(fields), None) => Ok(InputGroupKind::First(fields)),
            (None, Some(fields)) => Ok(InputGroupKind::All(fields)),
            _ => Err(crate::error::CoreError::permanent(
                "input group must have exactly one of `first` or `all`",
            )),
        }
    }
}

/// A selector/attr/transform rule, either a single definition or an ordered
/// list of alternatives tried in order (`firstMatch`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SelectorDef {
    FirstMatch {
        #[serde(rename = "firstMatch")]
        first_match: Vec<SingleSelector>,
    },
    Single(SingleSelector),
}

/// A single `{ select?, attr, transform? }` selector rule.
///
/// `select` is optional: when absent, the selector targets the current node
/// rather than a descendant.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    pub attr: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<TransformStep>,
}

/// One step of a transform chain: `[name, ...args]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TransformStep(pub Vec<serde_json::Value>);

impl TransformStep {
    /// The transform's name, i.e. the head of the step list. A permanent
    /// error if the step is empty or its head is not a string: each entry
    /// must itself be a list whose head is a transform name.
    pub fn name(&self) -> Result<&str, crate::error::CoreError> {
        self.0
            .first()
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                crate::error::CoreError::permanent(
                    "transform step must be a non-empty list whose head is a transform name",
                )
            })
    }

    /// The transform's positional arguments (everything after the name).
    pub fn args(&self) -> &[serde_json::Value] {
        if self.0.is_empty() { &[] } else { &self.0[1..] }
    }
}

/// An `output` section entry: the ordered fields a message's payload is built
/// from, plus redundancy/dedup metadata.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSchema {
    pub fields: Vec<OutputField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit_if_exists_any: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduplicate_by: Option<String>,
}

/// One declared output field. If `source` is absent the value comes from the
/// extraction context (`q`, `qurl`, or `ctry`); otherwise it names an `input`
/// group key and `key` must match a field declared under that group.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputField {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_keys: Option<Vec<String>>,
    #[serde(default)]
    pub optional: bool,
}
