//! Small shared helpers used across the extraction pipeline.

/// Whether a value is *present*: not absent, not an empty string.
///
/// # Examples
///
/// ```
/// use dfextract::utils::is_present;
///
/// assert!(is_present(&Some("hello".to_string())));
/// assert!(!is_present(&Some(String::new())));
/// assert!(!is_present(&None));
/// ```
pub fn is_present(value: &Option<String>) -> bool {
    matches!(value, Some(s) if !s.is_empty())
}

/// Whether a list of values is present: an empty list also counts as absent.
pub fn is_present_list<T>(values: &[T]) -> bool {
    !values.is_empty()
}

/// Trims a query string the way the cooldown fingerprint input is built from it.
pub fn trim_query(query: &str) -> &str {
    query.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_not_present() {
        assert!(!is_present(&Some(String::new())));
    }

    #[test]
    fn whitespace_only_string_is_present() {
        // Only emptiness disqualifies a value, not whitespace-only content.
        assert!(is_present(&Some("   ".to_string())));
    }

    #[test]
    fn empty_list_is_not_present() {
        assert!(!is_present_list::<String>(&[]));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(trim_query("  some query  "), "some query");
    }
}
