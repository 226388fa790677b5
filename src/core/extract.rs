//! Rule evaluator: walks the `input` section of a pattern, producing a
//! two-level extraction map.

use indexmap::IndexMap;
use scraper::{ElementRef, Html};
use url::Url;

use crate::core::pattern::{InputGroupKind, Rule, SelectorDef, SingleSelector};
use crate::core::selector::{parse_selector, run_selector};
use crate::core::transform::TransformRegistry;
use crate::error::CoreError;

/// The value an extraction produced for one field of one input group: a
/// single scalar for a `first`-type group, or an array parallel across the
/// group's root matches for an `all`-type group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedValue {
    Single(Option<String>),
    Array(Vec<Option<String>>),
}

impl ExtractedValue {
    pub fn as_single(&self) -> Option<&Option<String>> {
        match self {
            ExtractedValue::Single(v) => Some(v),
            ExtractedValue::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Option<String>]> {
        match self {
            ExtractedValue::Array(v) => Some(v),
            ExtractedValue::Single(_) => None,
        }
    }
}

/// Field name → extracted value, for one input group.
pub type FieldMap = IndexMap<String, ExtractedValue>;

/// Input-group key → its extracted fields. A group whose root selector never
/// matched (a `first` group with no element) has no entry at all — its
/// fields are left undefined, distinct from an `all` group that matched zero
/// elements (which is present, with every field mapped to an empty array).
pub type ExtractionMap = IndexMap<String, FieldMap>;

/// Walks `rule.input` against `doc`, producing the extraction map consumed by
/// the message assembler.
pub fn evaluate_inputs(
    doc: &Html,
    rule: &Rule,
    base: &Url,
    registry: &TransformRegistry,
) -> Result<ExtractionMap, CoreError> {
    let mut extraction = ExtractionMap::new();

    for (group_key, group) in &rule.input {
        let selector = parse_selector(group_key)?;

        match group.kind()? {
            InputGroupKind::First(fields) => {
                if let Some(item) = doc.select(&selector).next() {
                    let mut field_map = FieldMap::new();
                    for (field_key, def) in fields {
                        let value = evaluate_selector_def(item, def, base, registry)?;
                        field_map.insert(field_key.clone(), ExtractedValue::Single(value));
                    }
                    extraction.insert(group_key.clone(), field_map);
                }
            }
            InputGroupKind::All(fields) => {
                let items: Vec<ElementRef<'_>> = doc.select(&selector).collect();
                let mut field_map = FieldMap::new();
                for (field_key, def) in fields {
                    let mut values = Vec::with_capacity(items.len());
                    for item in &items {
                        values.push(evaluate_selector_def(*item, def, base, registry)?);
                    }
                    field_map.insert(field_key.clone(), ExtractedValue::Array(values));
                }
                extraction.insert(group_key.clone(), field_map);
            }
        }
    }

    Ok(extraction)
}

fn evaluate_selector_def(
    item: ElementRef<'_>,
    def: &SelectorDef,
    base: &Url,
    registry: &TransformRegistry,
) -> Result<Option<String>, CoreError> {
    match def {
        SelectorDef::Single(single) => evaluate_single(item, single, base, registry),
        SelectorDef::FirstMatch { first_match } => {
            for alt in first_match {
                let raw = run_selector(item, alt.select.as_deref(), &alt.attr, base)?;
                if raw.is_some() {
                    return registry.run_transforms(raw, &alt.transform);
                }
            }
            Ok(None)
        }
    }
}

fn evaluate_single(
    item: ElementRef<'_>,
    single: &SingleSelector,
    base: &Url,
    registry: &TransformRegistry,
) -> Result<Option<String>, CoreError> {
    let raw = run_selector(item, single.select.as_deref(), &single.attr, base)?;
    registry.run_transforms(raw, &single.transform)
}
