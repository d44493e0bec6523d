//! Scoring engine: pure, synchronous stages of a results computation
//!
//! [`SplitMatcher`] turns one athlete's detections into per-split results,
//! [`apply_manual_overrides`] merges operator corrections over them and
//! [`assign_ranks`] numbers the aggregated results. None of these stages do I/O
//! or hold shared state; the [`crate::orchestrator`] drives them per event.

pub mod matcher;
pub mod overrides;
pub mod ranking;

pub use matcher::{DEFAULT_OPEN_WINDOW_CEILING, MatchOutcome, SplitMatcher};
pub use overrides::{apply_manual_overrides, merged_status};
pub use ranking::{assign_ranks, leaderboard};
