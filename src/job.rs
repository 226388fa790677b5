//! Job entry point: wires the suspicion filter, cooldown gate, fetch
//! collaborator, and extraction engine together.
//!
//! Everything this module talks to outside the core is a collaborator trait —
//! fetching, HTML parsing, country sanitization, query suspicion filtering,
//! persisted-hash storage, and job scheduling are all external to the
//! extraction engine itself. A host wires its own implementations of these
//! traits (over HTTP, Redis, a scheduler, etc.) and builds a
//! [`DoublefetchJob`] from them.

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use scraper::Html;

use crate::config::Config;
use crate::cooldown::{end_of_utc_day, fingerprint, PersistedHashes};
use crate::core::{self, Context, Message, PatternSet, TransformRegistry};
use crate::error::{CoreError, JobError};

/// Supplies a consistent snapshot of the pattern set; the core reads it once
/// per extraction.
#[async_trait]
pub trait RulesProvider: Send + Sync {
    async fn get_rules_snapshot(&self) -> anyhow::Result<PatternSet>;
}

/// Reports a two-letter country code, or `"--"` if unknown.
pub trait CountrySanitizer: Send + Sync {
    fn safe_country_code(&self) -> String;
}

/// The suspicion filter's verdict on a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspicionVerdict {
    pub accept: bool,
    pub reason: Option<String>,
}

/// Decides whether a query is too suspicious (e.g. automated) to refetch.
#[async_trait]
pub trait QuerySuspicionFilter: Send + Sync {
    async fn check_suspicious_query(&self, query: &str) -> SuspicionVerdict;
}

/// Redirect-following policy forwarded to the fetch collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    #[default]
    Follow,
    Manual,
    Error,
}

/// The inbound request the job forwards to the fetch collaborator.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub headers: Vec<(String, String)>,
    pub redirect: RedirectPolicy,
    pub steps: Option<u32>,
    /// When set, HTTP 429 is treated as a permanent error rather than
    /// transient.
    pub treat_429_as_permanent_error: bool,
}

/// A fetched-and-parsed document, ready for the extraction engine.
pub struct FetchedDocument {
    pub html: Html,
    /// The URL actually fetched, after following any redirects — becomes
    /// `context.qurl`.
    pub final_url: String,
}

/// Fetches `url` anonymously and parses the response into a DOM. Already
/// classifies its own failures as permanent/transient (a 429 is permanent
/// when the request asks for that; everything else network- or
/// parse-related is transient).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, request: &FetchRequest) -> Result<FetchedDocument, CoreError>;
}

/// The job handler's result. The caller is responsible for however it wraps
/// and dispatches each message.
#[derive(Debug, Clone, Default)]
pub struct JobOutcome {
    pub messages: Vec<Message>,
}

impl JobOutcome {
    pub fn empty() -> Self {
        JobOutcome::default()
    }
}

/// Wires every collaborator together behind the handler name
/// `config.job_handler_name` registers under.
pub struct DoublefetchJob {
    pub rules: Arc<dyn RulesProvider>,
    pub sanitizer: Arc<dyn CountrySanitizer>,
    pub suspicion: Arc<dyn QuerySuspicionFilter>,
    pub fetcher: Arc<dyn Fetcher>,
    pub persisted_hashes: Arc<dyn PersistedHashes>,
    pub config: Config,
    pub registry: TransformRegistry,
}

impl DoublefetchJob {
    /// Runs the `"doublefetch-query"` handler for one `(category, query,
    /// url)` triple:
    ///
    /// 1. Reject suspicious queries before any work runs.
    /// 2. Acquire the cooldown slot; a non-newly-added fingerprint ends the
    ///    job with no messages.
    /// 3. Fetch and parse the document.
    /// 4. On fetch/parse failure, release the fingerprint and propagate.
    /// 5. Extract; no messages is a normal empty result.
    /// 6. On an extraction error, log and swallow it — **without** releasing
    ///    the fingerprint (retrying a pattern bug or a rate-limited site
    ///    helps no one).
    pub async fn run(
        &self,
        category: &str,
        query: &str,
        url: &str,
        request: FetchRequest,
    ) -> Result<JobOutcome, JobError> {
        let verdict = self.suspicion.check_suspicious_query(query).await;
        if !verdict.accept {
            log::info!(
                "doublefetch: rejected suspicious query for category `{category}`: {:?}",
                verdict.reason
            );
            return Ok(JobOutcome::empty());
        }

        let hash = fingerprint(category, query, &self.config);
        let expire_at = end_of_utc_day(SystemTime::now());
        let newly_added = self
            .persisted_hashes
            .add(&hash, expire_at)
            .await
            .map_err(JobError::Collaborator)?;
        if !newly_added {
            log::debug!("doublefetch: cooldown already active for category `{category}`");
            return Ok(JobOutcome::empty());
        }

        let fetched = match self.fetcher.fetch(url, &request).await {
            Ok(fetched) => fetched,
            Err(err) => {
                log::warn!("doublefetch: fetch/parse failed for category `{category}`: {err}");
                if let Err(release_err) = self.persisted_hashes.delete(&hash).await {
                    log::warn!(
                        "doublefetch: failed to release cooldown fingerprint after fetch failure: {release_err}"
                    );
                }
                return Err(JobError::Fetch(err));
            }
        };

        let patterns = self
            .rules
            .get_rules_snapshot()
            .await
            .map_err(JobError::Collaborator)?;
        let context = Context::new(query, fetched.final_url, self.sanitizer.safe_country_code());

        match core::run_extraction_for_category(
            fetched.html,
            &patterns,
            category,
            &context,
            &self.config,
            &self.registry,
        ) {
            Ok(messages) => Ok(JobOutcome { messages }),
            Err(err) => {
                // Deliberately does not release the fingerprint: an
                // unsupported pattern or a rate-limiting site is not made
                // better by retrying sooner.
                log::error!(
                    "doublefetch: extraction failed for category `{category}`, fingerprint kept: {err}"
                );
                Ok(JobOutcome::empty())
            }
        }
    }
}
