//! The pattern-driven extraction engine.
//!
//! Ties together, in order: preprocessing (prune), the rule evaluator
//! (build the extraction map), the message assembler, and the redundancy
//! filter. This is the whole of `run_extraction` — everything else in this
//! module is a leaf the pipeline calls into.

pub mod assemble;
pub mod context;
pub mod extract;
pub mod message;
pub mod pattern;
pub mod preprocess;
pub mod selector;
pub mod transform;

pub use context::Context;
pub use extract::{ExtractedValue, ExtractionMap};
pub use message::{Message, MessageBody, Payload, PayloadValue};
pub use pattern::{PatternSet, Rule};
pub use transform::TransformRegistry;

use scraper::Html;
use url::Url;

use crate::config::Config;
use crate::error::CoreError;

/// Runs the full extraction pipeline for one category against one parsed
/// document: preprocess → evaluate inputs → assemble outputs → redundancy
/// filter.
///
/// `doc` is consumed (and its prune directives applied in place) because the
/// pipeline owns it for the duration of a single extraction.
pub fn run_extraction(
    mut doc: Html,
    rule: &Rule,
    context: &Context,
    config: &Config,
    registry: &TransformRegistry,
) -> Result<Vec<Message>, CoreError> {
    let base = Url::parse(&context.qurl)
        .map_err(|e| CoreError::permanent(format!("context qurl is not a valid URL: {e}")))?;

    preprocess::run_preprocess(&mut doc, &rule.preprocess)?;
    let extraction = extract::evaluate_inputs(&doc, rule, &base, registry)?;
    assemble::assemble_messages(rule, &extraction, context, config)
}

/// Runs the extraction pipeline for `category` against an already-parsed
/// pattern set. An unknown category yields no messages rather than an error.
pub fn run_extraction_for_category(
    doc: Html,
    patterns: &PatternSet,
    category: &str,
    context: &Context,
    config: &Config,
    registry: &TransformRegistry,
) -> Result<Vec<Message>, CoreError> {
    match patterns.get(category) {
        Some(rule) => run_extraction(doc, rule, context, config, registry),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context::new("foo", "http://example.test/x?q=foo", "--")
    }

    #[test]
    fn unknown_category_yields_no_messages() {
        let patterns = PatternSet::new();
        let doc = Html::parse_document("<html><body></body></html>");
        let config = Config::default();
        let registry = TransformRegistry::with_builtins();
        let messages = run_extraction_for_category(
            doc,
            &patterns,
            "test-action",
            &context(),
            &config,
            &registry,
        )
        .unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn empty_rule_yields_no_messages() {
        let rule = Rule::default();
        let doc = Html::parse_document("<html><body></body></html>");
        let config = Config::default();
        let registry = TransformRegistry::with_builtins();
        let messages = run_extraction(doc, &rule, &context(), &config, &registry).unwrap();
        assert!(messages.is_empty());
    }
}
