//! Tonebench Core Library
//!
//! Core logic for rubric-based LLM-as-judge evaluation: judge output repair,
//! resumable batch runs over a per-item result store, and aggregate reports.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod diversity;
pub mod error;
pub mod extract;
pub mod failures;
pub mod format;
pub mod gather;
pub mod inputs;
pub mod judge;
pub mod logging;
pub mod parse;
pub mod provider;
pub mod record;
pub mod store;
