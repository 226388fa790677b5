//! Cooldown gate: the fingerprint and same-day expiration logic that decides
//! whether a refetch is allowed to run at all.
//!
//! The persisted set itself is an external collaborator — this module only
//! computes the fingerprint and expiry, and defines the trait the job entry
//! point uses to talk to whatever store a host provides.

use std::hash::Hasher;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use twox_hash::XxHash64;

use crate::config::Config;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// A persisted set of cooldown fingerprints, with same-day expiration.
/// `add` MUST be an atomic test-and-set — it is the only shared mutable
/// state the core observes.
#[async_trait]
pub trait PersistedHashes: Send + Sync {
    /// Inserts `hash` with expiration `expire_at`. Returns `true` iff it was
    /// newly inserted (i.e. not already present and unexpired).
    async fn add(&self, hash: &str, expire_at: SystemTime) -> anyhow::Result<bool>;

    /// Removes `hash`, allowing an immediate retry.
    async fn delete(&self, hash: &str) -> anyhow::Result<()>;
}

/// Computes the cooldown fingerprint for `(category, query)`: a fixed,
/// non-cryptographic 64-bit hash of `"{prefix}:{category}:{trimmed query}"`,
/// rendered as lowercase hex.
pub fn fingerprint(category: &str, query: &str, config: &Config) -> String {
    let trimmed = crate::utils::trim_query(query);
    let input = format!(
        "{}:{category}:{trimmed}",
        config.cooldown_fingerprint_prefix
    );

    let mut hasher = XxHash64::with_seed(0);
    hasher.write(input.as_bytes());
    format!("{:016x}", hasher.finish())
}

/// Returns the end of the UTC day containing `now` — a timezone-agnostic
/// daily expiration, identical across deployments in any timezone.
pub fn end_of_utc_day(now: SystemTime) -> SystemTime {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let days = since_epoch.as_secs() / SECONDS_PER_DAY;
    UNIX_EPOCH + Duration::from_secs((days + 1) * SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let config = Config::default();
        let a = fingerprint("test-action", "some query", &config);
        let b = fingerprint("test-action", "  some query  ", &config);
        assert_eq!(a, b, "fingerprint should trim the query");
    }

    #[test]
    fn fingerprint_differs_by_category_and_query() {
        let config = Config::default();
        let a = fingerprint("cat-a", "q", &config);
        let b = fingerprint("cat-b", "q", &config);
        let c = fingerprint("cat-a", "other", &config);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn end_of_utc_day_is_midnight_boundary() {
        // 2024-01-15T12:00:00Z
        let now = UNIX_EPOCH + Duration::from_secs(1_705_320_000);
        let end = end_of_utc_day(now);
        let secs = end.duration_since(UNIX_EPOCH).unwrap().as_secs();
        assert_eq!(secs % SECONDS_PER_DAY, 0);
        assert!(end > now);
        assert!(end.duration_since(now).unwrap() <= Duration::from_secs(SECONDS_PER_DAY));
    }
}
