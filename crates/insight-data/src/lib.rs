//! Ingestion and analysis pipeline for license-insight.
//!
//! Discovers and streams log sources, parses login/logout lines,
//! reconstructs per-user sessions, aggregates activity and license
//! metrics, and runs the top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod parser;
pub mod reader;
pub mod sessions;

pub use insight_core as core;
