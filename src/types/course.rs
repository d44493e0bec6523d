//! Race configuration entities: races, events, readers, splits and waves
//!
//! Field names serialize in PascalCase so a race configuration document reads
//! the same way the timing desk exports it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::clock;
use super::ids::{CategoryId, EventId, RaceId, SplitId, TimeReaderId, WaveId};
use crate::yaml_utils::duration_secs;

/// A race, the scoping key for every other configuration entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Race {
    pub id: RaceId,
    pub name: String,
    /// IANA timezone name the race is held in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// An event (distance) run as part of a race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub id: EventId,
    pub race_id: RaceId,
    pub name: String,
    /// Course distance in metres
    #[serde(default)]
    pub distance: f64,
    pub date: NaiveDate,
}

/// Athlete category within an event (e.g. "M40").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Category {
    pub id: CategoryId,
    pub event_id: EventId,
    pub name: String,
}

/// A named physical detection point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeReader {
    pub id: TimeReaderId,
    pub race_id: RaceId,
    pub name: String,
}

/// Role of a split on the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Start,
    Standard,
    Finish,
}

/// A configured checkpoint tied to a reader and a validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Split {
    pub id: SplitId,
    pub event_id: EventId,
    #[serde(default)]
    pub name: String,
    pub kind: SplitKind,
    /// Distance from the start line in metres
    #[serde(default)]
    pub distance_from_start: f64,
    pub time_reader_id: TimeReaderId,
    /// Earliest valid detection, relative to wave start
    #[serde(with = "duration_secs", default)]
    pub min_time: Duration,
    /// Latest valid detection, relative to wave start; zero means unbounded
    #[serde(with = "duration_secs", default)]
    pub max_time: Duration,
    /// Minimum time since the previous-lap split result
    #[serde(with = "duration_secs", default)]
    pub min_lap_time: Duration,
    #[serde(default)]
    pub previous_lap_split_id: Option<SplitId>,
}

impl Split {
    pub fn is_start(&self) -> bool {
        self.kind == SplitKind::Start
    }

    pub fn is_finish(&self) -> bool {
        self.kind == SplitKind::Finish
    }

    /// Inclusive `[min, max]` window for detections of this split.
    ///
    /// A zero `max_time` is replaced by `open_ceiling`.
    pub fn window(
        &self,
        wave_start: DateTime<Utc>,
        open_ceiling: Duration,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let max = if self.max_time.is_zero() { open_ceiling } else { self.max_time };
        (clock::offset(wave_start, self.min_time), clock::offset(wave_start, max))
    }

    /// Whether `tod` falls inside this split's window.
    pub fn in_window(
        &self,
        tod: DateTime<Utc>,
        wave_start: DateTime<Utc>,
        open_ceiling: Duration,
    ) -> bool {
        let (min, max) = self.window(wave_start, open_ceiling);
        tod >= min && tod <= max
    }
}

/// A group of athletes sharing a start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Wave {
    pub id: WaveId,
    pub event_id: EventId,
    #[serde(default)]
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub is_launched: bool,
}
