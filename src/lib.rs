//! Split matching, gun/net timing and ranking for chip-timed races.
//!
//! Finishline turns raw chip detections into validated per-checkpoint results:
//! which split every read belongs to, gun and net times, participation status
//! and rankings overall, per gender and per category.
//!
//! # Features
//!
//! - **Split matching**: time windows relative to the wave start, shared mats,
//!   multi-lap courses and missing start reads
//! - **Manual corrections**: operator-entered results replace computed ones
//! - **Guarded statuses**: computed statuses never override administrative ones
//! - **Lock-free configuration cache**: whole-race snapshots swapped atomically
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use finishline::{ConfigCache, EngineSettings, InMemoryStore, Orchestrator, RaceConfig};
//!
//! async fn score(yaml: &str) -> anyhow::Result<()> {
//!     let config = RaceConfig::parse(yaml)?;
//!
//!     let store = InMemoryStore::new();
//!     store.save_config(&config)?;
//!     let cache = Arc::new(ConfigCache::new());
//!     cache.update(&config)?;
//!
//!     let orchestrator =
//!         Orchestrator::new(store.clone(), store, cache, EngineSettings::default());
//!     let report = orchestrator.recompute_race(config.race.id).await?;
//!     println!("{} results across {} events", report.results.len(), report.events.len());
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod settings;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
mod yaml_utils;

// Scoring pipeline
pub mod engine;
pub mod orchestrator;
pub mod source;
pub mod sources;

// Core exports
pub use config::{ConfigCache, ConfigSnapshot, RaceConfig};
pub use error::*;
pub use settings::EngineSettings;
pub use types::*;

// Pipeline exports
pub use engine::{SplitMatcher, apply_manual_overrides, assign_ranks, leaderboard};
pub use orchestrator::{EventResults, Orchestrator, RecomputeReport, StatusChange};
pub use source::{ResultSink, ResultSource};
pub use sources::InMemoryStore;
