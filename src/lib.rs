//! A pattern-driven DOM extraction engine for privacy-preserving
//! search-results telemetry.
//!
//! A host supplies a per-category [`core::pattern::Rule`] (normally sourced
//! from a collaborator-provided pattern set, [`core::PatternSet`]) describing
//! what to pull out of a fetched results page and how to assemble it into
//! outbound messages. This crate owns everything between "already-parsed
//! HTML" and "a list of messages": preprocessing (element pruning), the
//! selector/transform evaluator, the message assembler, and the redundancy
//! filter.
//!
//! [`job`] wires that engine to the external collaborators a full job run
//! needs — fetching, query suspicion filtering, country sanitization, and
//! cooldown-fingerprint storage — each expressed as a trait a host implements.

pub mod config;
pub mod cooldown;
pub mod core;
pub mod error;
pub mod job;
pub mod utils;

pub use config::Config;
pub use core::{run_extraction, run_extraction_for_category, Context, Message, PatternSet, Rule};
pub use error::{CoreError, JobError};
