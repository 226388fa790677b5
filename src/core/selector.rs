//! Selector evaluator: given a DOM node, a CSS-like selector, and an
//! attribute request, yields a scalar value.

use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::CoreError;

/// `attr` value meaning "the element's concatenated descendant text",
/// matching the DOM `textContent` property.
pub const ATTR_TEXT_CONTENT: &str = "textContent";
/// `attr` value meaning "the resolved `href`", with parser-independent,
/// no-double-encoding resolution against a base URL.
pub const ATTR_HREF: &str = "href";

/// Parses a CSS selector, reporting a permanent error on invalid syntax —
/// a malformed selector is a malformed pattern, never a transient condition.
pub fn parse_selector(selector: &str) -> Result<Selector, CoreError> {
    Selector::parse(selector)
        .map_err(|e| CoreError::permanent(format!("invalid selector `{selector}`: {e:?}")))
}

/// Evaluates a single selector/attr rule against `root`.
///
/// 1. If `select` is present, the target is the first descendant match;
///    otherwise the target is `root` itself.
/// 2. Absent target → `None`.
/// 3. `textContent` → the element's concatenated descendant text.
/// 4. `href` → the **raw** attribute value resolved against `base`, never a
///    DOM-resolved property (parsers disagree on what a relative `href`
///    resolves against). An href that fails to resolve against `base` (e.g.
///    genuinely malformed input from the page) is treated as absent rather
///    than as an error — the page's markup is untrusted content, not part of
///    the pattern, so its quirks don't get to fail the whole extraction.
/// 5. Any other `attr` → the element's raw attribute value, or `None`.
pub fn run_selector(
    root: ElementRef<'_>,
    select: Option<&str>,
    attr: &str,
    base: &Url,
) -> Result<Option<String>, CoreError> {
    let elem = match select {
        Some(selector_str) => {
            let selector = parse_selector(selector_str)?;
            root.select(&selector).next()
        }
        None => Some(root),
    };

    let Some(elem) = elem else {
        return Ok(None);
    };

    match attr {
        ATTR_TEXT_CONTENT => Ok(Some(elem.text().collect::<String>())),
        ATTR_HREF => {
            let raw = elem.value().attr(ATTR_HREF);
            match raw {
                None => Ok(None),
                Some(raw) if raw.is_empty() => Ok(None),
                Some(raw) => Ok(base.join(raw).ok().map(|u| u.to_string())),
            }
        }
        other => Ok(elem.value().attr(other).map(|s| s.to_string())),
    }
}
