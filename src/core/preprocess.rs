//! Preprocessor: runs `prune` directives on the document before the rule
//! evaluator walks the `input` section.
//!
//! Pruning is real tree surgery, not a traversal-time filter: each matched
//! element is detached from its parent, so every later `select`/`text`
//! operation — in preprocessing itself, in the rule evaluator, and in the
//! message assembler — simply never sees it again.

use scraper::Html;

use crate::core::pattern::{PruneDirective, PruneKind};
use crate::core::selector::parse_selector;
use crate::error::CoreError;

/// Resolves a [`PruneDirective`]'s shape. A permanent error unless exactly
/// one of `first`/`all` is set.
pub fn resolve_prune_kind(directive: &PruneDirective) -> Result<PruneKind, CoreError> {
    match (&directive.first, &directive.all) {
        (Some(s), None) => Ok(PruneKind::First(s.clone())),
        (None, Some(s)) => Ok(PruneKind::All(s.clone())),
        _ => Err(CoreError::permanent(
            "prune directive must have exactly one of `first` or `all`",
        )),
    }
}

/// Runs every `preprocess` directive against `doc`, in order, mutating it in
/// place.
pub fn run_preprocess(doc: &mut Html, directives: &[PruneDirective]) -> Result<(), CoreError> {
    for directive in directives {
        run_one(doc, &resolve_prune_kind(directive)?)?;
    }
    Ok(())
}

fn run_one(doc: &mut Html, kind: &PruneKind) -> Result<(), CoreError> {
    let selector_str = match kind {
        PruneKind::First(s) | PruneKind::All(s) => s.as_str(),
    };
    let selector = parse_selector(selector_str)?;

    let matched_ids: Vec<_> = doc.select(&selector).map(|elem| elem.id()).collect();
    let ids_to_remove = match kind {
        PruneKind::First(_) => matched_ids.into_iter().take(1).collect::<Vec<_>>(),
        PruneKind::All(_) => matched_ids,
    };

    for id in ids_to_remove {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    Ok(())
}
