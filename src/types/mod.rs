//! Core types for race configuration, detections and computed results.
//!
//! ## Architecture
//!
//! - [`Race`], [`Event`], [`Split`], [`Wave`], [`TimeReader`] and [`Category`] describe
//!   a race configuration as it is saved by the timing desk
//! - [`Athlete`] and [`ReaderRecord`] are the raw inputs of a computation cycle
//! - [`AthleteTrace`] is one athlete's scoring input, detections already filtered
//! - [`AthleteSplit`] is the computed output, one per (athlete, split)
//! - [`AthleteStatus`] is a closed set guarded by an explicit transition table
//!
//! A split that was never crossed is modelled as [`Passage::NotVisited`] rather than
//! a zero duration, so unfinished athletes never sort ahead of finishers.
//!
//! ## Usage Example
//!
//! ```rust
//! use finishline::types::{AthleteStatus, SplitKind, is_valid_transition};
//!
//! assert!(is_valid_transition(AthleteStatus::Running, AthleteStatus::Finished));
//! assert!(!is_valid_transition(AthleteStatus::Disqualified, AthleteStatus::Finished));
//! assert_ne!(SplitKind::Start, SplitKind::Finish);
//! ```

mod athlete;
mod athlete_split;
pub mod clock;
mod course;
mod ids;
mod status;

pub use athlete::{Athlete, AthleteTrace, Detection, Gender, ReaderRecord};
pub use athlete_split::{AthleteSplit, Passage, Ranks, SplitTiming, TimeBasis};
pub use course::{Category, Event, Race, Split, SplitKind, TimeReader, Wave};
pub use ids::{AthleteId, CategoryId, EventId, RaceId, SplitId, TimeReaderId, WaveId};
pub use status::{AthleteStatus, is_valid_transition};
