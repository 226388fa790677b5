//! Extraction context: the query, the fetched URL, and the country code a
//! message's context-sourced output fields are drawn from.

use serde::{Deserialize, Serialize};

/// Per-extraction context, supplied by the job entry point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Context {
    /// The original search query.
    pub q: String,
    /// The URL that was actually fetched.
    pub qurl: String,
    /// Two-letter country code, or `"--"` if unknown.
    pub ctry: String,
}

impl Context {
    pub fn new(q: impl Into<String>, qurl: impl Into<String>, ctry: impl Into<String>) -> Self {
        Context {
            q: q.into(),
            qurl: qurl.into(),
            ctry: ctry.into(),
        }
    }

    /// Looks up a context field by its output-field `key`. Returns `None` for
    /// any key that isn't one of `q`/`qurl`/`ctry` (the caller treats an
    /// unrecognized context key the same as an absent value).
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "q" => Some(self.q.as_str()),
            "qurl" => Some(self.qurl.as_str()),
            "ctry" => Some(self.ctry.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_known_fields() {
        let ctx = Context::new("some-query", "http://example.test/x?q=some-query", "de");
        assert_eq!(ctx.get("q"), Some("some-query"));
        assert_eq!(ctx.get("qurl"), Some("http://example.test/x?q=some-query"));
        assert_eq!(ctx.get("ctry"), Some("de"));
        assert_eq!(ctx.get("unknown"), None);
    }
}
