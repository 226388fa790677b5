//! Error classification for the extraction engine and the job that wraps it.
//!
//! The core only ever raises one of two kinds of error: permanent (retrying
//! changes nothing — a malformed pattern, an unknown transform, a
//! rejected-forever HTTP status) or transient (a retry later may succeed — a
//! network blip, a parse failure on a truncated response).

use std::fmt;

/// An error raised by the extraction engine (`crate::core`).
///
/// There are exactly two kinds. Nothing in `core` raises anything else;
/// collaborators outside the core (fetch, country sanitization,
/// persisted-hash storage) report their own errors through [`JobError`]
/// instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Retrying the same pattern against the same document will never help:
    /// a malformed pattern shape, an unknown transform name, or a permanent
    /// HTTP status forwarded from the fetch collaborator.
    Permanent(String),
    /// A transient condition: network failure, or HTML too malformed to parse.
    Transient(String),
}

impl CoreError {
    pub fn permanent(message: impl Into<String>) -> Self {
        CoreError::Permanent(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        CoreError::Transient(message.into())
    }

    /// Whether the caller should skip retrying. Drives the cooldown-fingerprint
    /// release decision at the job boundary.
    pub fn is_permanent(&self) -> bool {
        matches!(self, CoreError::Permanent(_))
    }

    pub fn message(&self) -> &str {
        match self {
            CoreError::Permanent(m) | CoreError::Transient(m) => m,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Permanent(m) => write!(f, "permanent extraction error: {m}"),
            CoreError::Transient(m) => write!(f, "transient extraction error: {m}"),
        }
    }
}

impl std::error::Error for CoreError {}

/// An error surfaced by the job entry point (`crate::job`), one level above
/// [`CoreError`]. Fetch errors are not part of the core's error taxonomy since
/// fetching is an external collaborator, but the job still has to classify
/// them to decide whether to release the cooldown fingerprint.
#[derive(Debug)]
pub enum JobError {
    /// The extraction engine raised a [`CoreError`].
    Core(CoreError),
    /// The fetch or HTML-parse collaborator failed. The cooldown fingerprint
    /// is released regardless of whether the underlying failure was itself
    /// permanent (429) or transient: any fetch/parse failure releases the
    /// fingerprint, independent of its own classification.
    Fetch(CoreError),
    /// The rules snapshot provider or persisted-hash store failed. Neither
    /// is part of the core's error taxonomy (both are external
    /// collaborators), so their failures are reported as-is.
    Collaborator(anyhow::Error),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Core(e) => write!(f, "{e}"),
            JobError::Fetch(e) => write!(f, "fetch failed: {e}"),
            JobError::Collaborator(e) => write!(f, "collaborator failed: {e}"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobError::Core(e) | JobError::Fetch(e) => Some(e),
            JobError::Collaborator(e) => Some(e.as_ref()),
        }
    }
}

impl From<CoreError> for JobError {
    fn from(e: CoreError) -> Self {
        JobError::Core(e)
    }
}
