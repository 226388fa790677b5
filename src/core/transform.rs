//! Transform registry and chain evaluator.
//!
//! A transform is a pure, unary function over a scalar string, named in a
//! pattern's `transform` list as `[name, ...args]`. Looking a name up is
//! deferred to the moment a chain actually runs so that a pattern set
//! referencing a not-yet-shipped transform doesn't fail to load — only
//! extractions that actually exercise that step fail, and fail permanently.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::core::pattern::TransformStep;
use crate::error::CoreError;

/// A pure unary transform: takes the current scalar value and the step's
/// positional arguments, returns the next scalar value (or `None` to collapse
/// to absent).
pub type TransformFn = fn(&str, &[Value]) -> Result<Option<String>, CoreError>;

/// Looks up transform functions by name and evaluates transform chains.
pub struct TransformRegistry {
    transforms: HashMap<&'static str, TransformFn>,
}

impl TransformRegistry {
    /// The builtin transform set.
    pub fn with_builtins() -> Self {
        let mut transforms: HashMap<&'static str, TransformFn> = HashMap::new();
        transforms.insert("trim", trim);
        transforms.insert("lowercase", lowercase);
        transforms.insert("uppercase", uppercase);
        transforms.insert("slice", slice);
        transforms.insert("replace", replace);
        transforms.insert("regexReplace", regex_replace);
        transforms.insert("truncate", truncate);
        transforms.insert("stripQueryParams", strip_query_params);
        TransformRegistry { transforms }
    }

    /// Registers or overrides a transform. Lets a host extend the registry
    /// without forking this crate.
    pub fn register(&mut self, name: &'static str, f: TransformFn) {
        self.transforms.insert(name, f);
    }

    /// Looks up a transform by name. A permanent error for an unknown name —
    /// evaluated here, at call time, never at pattern-load time.
    pub fn lookup(&self, name: &str) -> Result<TransformFn, CoreError> {
        self.transforms
            .get(name)
            .copied()
            .ok_or_else(|| CoreError::permanent(format!("unknown transform: {name}")))
    }

    /// Runs a full transform chain over a value.
    ///
    /// A `None` input short-circuits to `None` without consulting the
    /// registry at all. Otherwise every step's name is resolved (so an
    /// unknown name always surfaces, even if an earlier step already
    /// collapsed the running value to `None`), and each step's function runs
    /// only while the running value remains present.
    pub fn run_transforms(
        &self,
        value: Option<String>,
        steps: &[TransformStep],
    ) -> Result<Option<String>, CoreError> {
        if value.is_none() {
            return Ok(None);
        }
        let mut current = value;
        for step in steps {
            let name = step.name()?;
            let f = self.lookup(name)?;
            current = match current {
                Some(s) => f(&s, step.args())?,
                None => None,
            };
        }
        Ok(current)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn arg_str(args: &[Value], index: usize) -> Result<String, CoreError> {
    args.get(index)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| CoreError::permanent(format!("transform missing string argument {index}")))
}

fn arg_usize_opt(args: &[Value], index: usize) -> Option<usize> {
    args.get(index).and_then(|v| v.as_u64()).map(|v| v as usize)
}

fn trim(value: &str, _args: &[Value]) -> Result<Option<String>, CoreError> {
    Ok(Some(value.trim().to_string()))
}

fn lowercase(value: &str, _args: &[Value]) -> Result<Option<String>, CoreError> {
    Ok(Some(value.to_lowercase()))
}

fn uppercase(value: &str, _args: &[Value]) -> Result<Option<String>, CoreError> {
    Ok(Some(value.to_uppercase()))
}

/// `["slice", start, end?]` — a UTF-8-safe substring by character index.
fn slice(value: &str, args: &[Value]) -> Result<Option<String>, CoreError> {
    let start = arg_usize_opt(args, 0).ok_or_else(|| {
        CoreError::permanent("slice transform requires a numeric start argument")
    })?;
    let chars: Vec<char> = value.chars().collect();
    let end = arg_usize_opt(args, 1).unwrap_or(chars.len()).min(chars.len());
    let start = start.min(end);
    Ok(Some(chars[start..end].iter().collect()))
}

/// `["replace", from, to]` — replaces every literal occurrence of `from`.
fn replace(value: &str, args: &[Value]) -> Result<Option<String>, CoreError> {
    let from = arg_str(args, 0)?;
    let to = arg_str(args, 1)?;
    Ok(Some(value.replace(&from, &to)))
}

/// `["regexReplace", pattern, replacement]`.
fn regex_replace(value: &str, args: &[Value]) -> Result<Option<String>, CoreError> {
    let pattern = arg_str(args, 0)?;
    let replacement = arg_str(args, 1)?;
    let re = Regex::new(&pattern)
        .map_err(|e| CoreError::permanent(format!("invalid regexReplace pattern: {e}")))?;
    Ok(Some(re.replace_all(value, replacement.as_str()).into_owned()))
}

/// `["truncate", maxLen]` — truncates to at most `maxLen` characters.
fn truncate(value: &str, args: &[Value]) -> Result<Option<String>, CoreError> {
    let max_len = arg_usize_opt(args, 0)
        .ok_or_else(|| CoreError::permanent("truncate transform requires a numeric length"))?;
    Ok(Some(value.chars().take(max_len).collect()))
}

/// `["stripQueryParams"]` — drops everything from the first `?` onward, used
/// to normalize tracked search-result links before they're emitted.
fn strip_query_params(value: &str, _args: &[Value]) -> Result<Option<String>, CoreError> {
    let trimmed = value.split('?').next().unwrap_or(value);
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pattern::TransformStep;

    fn step(args: Vec<Value>) -> TransformStep {
        TransformStep(args)
    }

    #[test]
    fn null_input_short_circuits_before_lookup() {
        let registry = TransformRegistry::with_builtins();
        let steps = vec![step(vec![Value::String("thisBuiltinDoesNotExist".into())])];
        let result = registry.run_transforms(None, &steps).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn unknown_transform_is_permanent() {
        let registry = TransformRegistry::with_builtins();
        let steps = vec![step(vec![Value::String("thisBuiltinDoesNotExist".into())])];
        let err = registry
            .run_transforms(Some("hello".to_string()), &steps)
            .unwrap_err();
        assert!(err.is_permanent());
    }

    #[test]
    fn empty_chain_is_identity() {
        let registry = TransformRegistry::with_builtins();
        let result = registry
            .run_transforms(Some("hello".to_string()), &[])
            .unwrap();
        assert_eq!(result, Some("hello".to_string()));
    }

    #[test]
    fn trim_lowercase_chain() {
        let registry = TransformRegistry::with_builtins();
        let steps = vec![
            step(vec![Value::String("trim".into())]),
            step(vec![Value::String("lowercase".into())]),
        ];
        let result = registry
            .run_transforms(Some("  HELLO  ".to_string()), &steps)
            .unwrap();
        assert_eq!(result, Some("hello".to_string()));
    }

    #[test]
    fn strip_query_params_drops_suffix() {
        let result = strip_query_params("https://example.test/path?utm_source=x", &[]).unwrap();
        assert_eq!(result, Some("https://example.test/path".to_string()));
    }

    #[test]
    fn slice_is_char_safe() {
        let result = slice("héllo world", &[Value::from(0), Value::from(5)]).unwrap();
        assert_eq!(result, Some("héllo".to_string()));
    }
}
