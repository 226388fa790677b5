//! Runtime tunables for the extraction engine and job entry point.
//!
//! Mirrors `glot::config::Config`: a `serde`-deserializable struct with
//! `#[serde(default)]` fields so a host embedding this crate can override a
//! subset of values from its own configuration format without us taking an
//! opinion on file layout, CLI flags, or env vars.

use serde::{Deserialize, Serialize};

/// Configuration for the doublefetch extraction job.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Exclusive upper bound for the `anti-duplicates` nonce, drawn uniformly
    /// from `[0, anti_duplicate_bound)`.
    #[serde(default = "default_anti_duplicate_bound")]
    pub anti_duplicate_bound: u32,

    /// Prefix used when building the cooldown fingerprint input string, i.e.
    /// the `dfq` in `dfq:{category}:{query}`.
    #[serde(default = "default_cooldown_fingerprint_prefix")]
    pub cooldown_fingerprint_prefix: String,

    /// Name the job registers itself under with the (external) job scheduler.
    #[serde(default = "default_job_handler_name")]
    pub job_handler_name: String,
}

fn default_anti_duplicate_bound() -> u32 {
    10_000_000
}

fn default_cooldown_fingerprint_prefix() -> String {
    "dfq".to_string()
}

fn default_job_handler_name() -> String {
    "doublefetch-query".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            anti_duplicate_bound: default_anti_duplicate_bound(),
            cooldown_fingerprint_prefix: default_cooldown_fingerprint_prefix(),
            job_handler_name: default_job_handler_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_documented_constants() {
        let config = Config::default();
        assert_eq!(config.anti_duplicate_bound, 10_000_000);
        assert_eq!(config.cooldown_fingerprint_prefix, "dfq");
        assert_eq!(config.job_handler_name, "doublefetch-query");
    }

    #[test]
    fn deserializes_with_partial_overrides() {
        let config: Config = serde_json::from_str(r#"{"antiDuplicateBound": 100}"#).unwrap();
        assert_eq!(config.anti_duplicate_bound, 100);
        assert_eq!(config.cooldown_fingerprint_prefix, "dfq");
    }
}
