//! Message types: the output of a single extraction.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Protocol version stamped on every message body.
pub const MESSAGE_VERSION: u8 = 4;

/// A payload value: either a scalar (context fields, single-value fields) or
/// a positional mapping produced by an array-merged field. Index-as-string
/// keys (`"0"`, `"1"`, …) are intentional wire shape, not an implementation
/// shortcut; see `DESIGN.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Scalar(Option<String>),
    Entries(IndexMap<String, IndexMap<String, Option<String>>>),
}

/// The per-action payload: output-field name → value, insertion-ordered to
/// match the schema's declared field order.
pub type Payload = IndexMap<String, PayloadValue>;

/// The body of an emitted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub action: String,
    pub payload: Payload,
    pub ver: u8,
    #[serde(rename = "anti-duplicates")]
    pub anti_duplicates: u32,
}

/// A fully assembled, ready-to-send message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub body: MessageBody,
    #[serde(rename = "deduplicateBy", skip_serializing_if = "Option::is_none")]
    pub deduplicate_by: Option<String>,
}

impl Message {
    pub fn action(&self) -> &str {
        &self.body.action
    }
}
