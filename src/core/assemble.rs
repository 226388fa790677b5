//! Message assembler and redundancy filter.

use std::collections::HashSet;

use indexmap::IndexMap;
use rand::Rng;

use crate::config::Config;
use crate::core::context::Context;
use crate::core::extract::{ExtractedValue, ExtractionMap, FieldMap};
use crate::core::message::{Message, MessageBody, Payload, PayloadValue, MESSAGE_VERSION};
use crate::core::pattern::{OutputField, OutputSchema, Rule};
use crate::error::CoreError;
use crate::utils::{is_present, is_present_list};

/// Walks `rule.output` in declared order, builds a message per eligible
/// action, then drops messages whose `omitIfExistsAny` fires. Actions are
/// considered in the pattern's declaration order and emitted messages
/// preserve that order.
pub fn assemble_messages(
    rule: &Rule,
    extraction: &ExtractionMap,
    context: &Context,
    config: &Config,
) -> Result<Vec<Message>, CoreError> {
    let mut emitted = Vec::new();

    for (action, schema) in &rule.output {
        if let Some(payload) = build_payload(schema, rule, extraction, context)? {
            emitted.push(Message {
                body: MessageBody {
                    action: action.clone(),
                    payload,
                    ver: MESSAGE_VERSION,
                    anti_duplicates: random_anti_duplicate(config),
                },
                deduplicate_by: schema.deduplicate_by.clone(),
            });
        }
    }

    Ok(apply_redundancy_filter(rule, emitted))
}

/// Drops any message whose schema's `omitIfExistsAny` contains at least one
/// *other* emitted action. This is a single pass against the pre-filter set
/// of emitted actions — a message is never re-evaluated against the
/// already-filtered result, and listing its own action in `omitIfExistsAny`
/// never causes it to drop itself.
fn apply_redundancy_filter(rule: &Rule, emitted: Vec<Message>) -> Vec<Message> {
    let emitted_actions: HashSet<&str> = emitted.iter().map(|m| m.action()).collect();

    emitted
        .into_iter()
        .filter(|m| {
            let Some(schema) = rule.output.get(m.action()) else {
                return true;
            };
            !schema
                .omit_if_exists_any
                .iter()
                .any(|other| other != m.action() && emitted_actions.contains(other.as_str()))
        })
        .collect()
}

fn random_anti_duplicate(config: &Config) -> u32 {
    rand::thread_rng().gen_range(0..config.anti_duplicate_bound)
}

/// Builds one action's payload, or `None` if the action must be discarded
/// (a non-optional field came up absent).
fn build_payload(
    schema: &OutputSchema,
    rule: &Rule,
    extraction: &ExtractionMap,
    context: &Context,
) -> Result<Option<Payload>, CoreError> {
    let mut payload = Payload::new();

    for field in &schema.fields {
        match &field.source {
            None => assign_context_field(&mut payload, field, context),
            Some(source) => {
                if assign_input_field(&mut payload, field, source, rule, extraction)?.is_none() {
                    return Ok(None);
                }
            }
        }
    }

    Ok(Some(payload))
}

/// Context field: never discards the action. Absent-and-required means "skip
/// inserting the key", not "fail the action".
fn assign_context_field(payload: &mut Payload, field: &OutputField, context: &Context) {
    let value = context.get(&field.key).map(|s| s.to_string());
    if is_present(&value) {
        payload.insert(field.key.clone(), PayloadValue::Scalar(value));
    }
}

/// Input-sourced field (single-value or array-merged). Returns `Ok(None)`
/// to signal the whole action must be discarded.
fn assign_input_field(
    payload: &mut Payload,
    field: &OutputField,
    source: &str,
    rule: &Rule,
    extraction: &ExtractionMap,
) -> Result<Option<()>, CoreError> {
    if !rule.input.contains_key(source) {
        return Err(CoreError::permanent(format!(
            "output field `{}` references unknown input group `{source}`",
            field.key
        )));
    }

    let Some(group_fields) = extraction.get(source) else {
        // The input group is declared but matched no element at runtime
        // (a `first` group whose selector found nothing) — equivalent to an
        // absent single value.
        if !field.optional {
            return Ok(None);
        }
        payload.insert(field.key.clone(), PayloadValue::Scalar(None));
        return Ok(Some(()));
    };

    let value = group_fields.get(&field.key).ok_or_else(|| {
        CoreError::permanent(format!(
            "output field `{}` is not declared under input group `{source}`",
            field.key
        ))
    })?;

    match value {
        ExtractedValue::Single(v) => {
            if !field.optional && !is_present(v) {
                return Ok(None);
            }
            payload.insert(field.key.clone(), PayloadValue::Scalar(v.clone()));
            Ok(Some(()))
        }
        ExtractedValue::Array(_) => {
            let required_keys = field
                .required_keys
                .clone()
                .unwrap_or_else(|| group_fields.keys().cloned().collect());
            let entries = build_array_entries(group_fields, &required_keys);
            if !is_present_list(&entries) && !field.optional {
                return Ok(None);
            }
            payload.insert(field.key.clone(), PayloadValue::Entries(index_entries(entries)));
            Ok(Some(()))
        }
    }
}

/// Zips every field declared under an `all`-type input group into an
/// array-of-objects, filtered to entries where every required key is
/// present.
fn build_array_entries(
    group_fields: &FieldMap,
    required_keys: &[String],
) -> Vec<IndexMap<String, Option<String>>> {
    let len = group_fields
        .values()
        .filter_map(ExtractedValue::as_array)
        .map(|arr| arr.len())
        .max()
        .unwrap_or(0);

    let mut entries = Vec::new();
    for i in 0..len {
        let mut entry = IndexMap::new();
        for (field_name, value) in group_fields {
            if let Some(arr) = value.as_array() {
                entry.insert(field_name.clone(), arr[i].clone());
            }
        }
        let keep = required_keys
            .iter()
            .all(|key| entry.get(key).is_some_and(is_present));
        if keep {
            entries.push(entry);
        }
    }
    entries
}

fn index_entries(
    entries: Vec<IndexMap<String, Option<String>>>,
) -> IndexMap<String, IndexMap<String, Option<String>>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| (i.to_string(), entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pattern::{InputGroup, OutputField};
    use scraper::Html;

    fn ctx() -> Context {
        Context::new("some-query", "http://example.test/x?q=some-query", "de")
    }

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn context_field_discards_never_fire() {
        let mut rule = Rule::default();
        rule.output.insert(
            "action".to_string(),
            OutputSchema {
                fields: vec![OutputField {
                    key: "missing".to_string(),
                    source: None,
                    required_keys: None,
                    optional: false,
                }],
                omit_if_exists_any: vec![],
                deduplicate_by: None,
            },
        );
        let extraction = ExtractionMap::new();
        let messages = assemble_messages(&rule, &extraction, &ctx(), &config()).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].body.payload.contains_key("missing"));
    }

    #[test]
    fn single_value_field_discards_action_when_required_and_absent() {
        let mut rule = Rule::default();
        rule.input.insert(
            "div#foo".to_string(),
            InputGroup {
                first: Some(IndexMap::new()),
                all: None,
            },
        );
        rule.output.insert(
            "action".to_string(),
            OutputSchema {
                fields: vec![OutputField {
                    key: "x".to_string(),
                    source: Some("div#foo".to_string()),
                    required_keys: None,
                    optional: false,
                }],
                omit_if_exists_any: vec![],
                deduplicate_by: None,
            },
        );
        let extraction = ExtractionMap::new(); // group never matched
        let messages = assemble_messages(&rule, &extraction, &ctx(), &config()).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn unknown_source_is_permanent() {
        let mut rule = Rule::default();
        rule.output.insert(
            "action".to_string(),
            OutputSchema {
                fields: vec![OutputField {
                    key: "x".to_string(),
                    source: Some("never-declared".to_string()),
                    required_keys: None,
                    optional: true,
                }],
                omit_if_exists_any: vec![],
                deduplicate_by: None,
            },
        );
        let extraction = ExtractionMap::new();
        let err = assemble_messages(&rule, &extraction, &ctx(), &config()).unwrap_err();
        assert!(err.is_permanent());
    }

    #[test]
    fn redundancy_filter_drops_b_keeps_a_and_c() {
        let mut rule = Rule::default();
        for (action, omit) in [
            ("A", vec![]),
            ("B", vec!["A".to_string()]),
            ("C", vec!["nonexistent".to_string()]),
        ] {
            rule.output.insert(
                action.to_string(),
                OutputSchema {
                    fields: vec![OutputField {
                        key: "q".to_string(),
                        source: None,
                        required_keys: None,
                        optional: false,
                    }],
                    omit_if_exists_any: omit,
                    deduplicate_by: None,
                },
            );
        }
        let extraction = ExtractionMap::new();
        let messages = assemble_messages(&rule, &extraction, &ctx(), &config()).unwrap();
        let actions: Vec<&str> = messages.iter().map(|m| m.action()).collect();
        assert_eq!(actions, vec!["A", "C"]);
    }

    #[test]
    fn self_reference_in_omit_if_exists_any_is_not_self_dropping() {
        let mut rule = Rule::default();
        rule.output.insert(
            "A".to_string(),
            OutputSchema {
                fields: vec![OutputField {
                    key: "q".to_string(),
                    source: None,
                    required_keys: None,
                    optional: false,
                }],
                omit_if_exists_any: vec!["A".to_string()],
                deduplicate_by: None,
            },
        );
        let extraction = ExtractionMap::new();
        let messages = assemble_messages(&rule, &extraction, &ctx(), &config()).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn array_merged_field_is_positionally_indexed() {
        let doc = Html::parse_document(r#"<ul><li data-id="1">a</li><li data-id="2">b</li></ul>"#);
        let mut fields = IndexMap::new();
        fields.insert(
            "id".to_string(),
            crate::core::pattern::SelectorDef::Single(crate::core::pattern::SingleSelector {
                select: None,
                attr: "data-id".to_string(),
                transform: vec![],
            }),
        );
        let mut rule = Rule::default();
        rule.input.insert(
            "li".to_string(),
            InputGroup {
                first: None,
                all: Some(fields),
            },
        );
        rule.output.insert(
            "action".to_string(),
            OutputSchema {
                fields: vec![OutputField {
                    key: "id".to_string(),
                    source: Some("li".to_string()),
                    required_keys: None,
                    optional: false,
                }],
                omit_if_exists_any: vec![],
                deduplicate_by: None,
            },
        );
        let registry = crate::core::transform::TransformRegistry::with_builtins();
        let base = url::Url::parse("http://example.test/x?q=some-query").unwrap();
        let extraction = crate::core::extract::evaluate_inputs(&doc, &rule, &base, &registry).unwrap();
        let messages = assemble_messages(&rule, &extraction, &ctx(), &config()).unwrap();
        assert_eq!(messages.len(), 1);
        match &messages[0].body.payload["id"] {
            PayloadValue::Entries(entries) => {
                assert_eq!(entries["0"]["id"], Some("1".to_string()));
                assert_eq!(entries["1"]["id"], Some("2".to_string()));
            }
            other => panic!("expected Entries, got {other:?}"),
        }
    }
}
