//! Athletes and the raw detections recorded for their chips

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AthleteId, CategoryId, EventId, RaceId, TimeReaderId, WaveId};
use super::status::AthleteStatus;

/// Gender used for the gender ranking scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[serde(alias = "x")]
    NonBinary,
    #[default]
    Unspecified,
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Athlete {
    pub id: AthleteId,
    pub race_id: RaceId,
    pub event_id: EventId,
    pub wave_id: WaveId,
    pub bib: String,
    pub chip: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub status: AthleteStatus,
}

/// A raw chip detection as written by a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReaderRecord {
    pub chip: String,
    pub tod: DateTime<Utc>,
    pub time_reader_id: TimeReaderId,
    /// False when the record was filtered as invalid or duplicate upstream
    #[serde(default = "usable")]
    pub can_use: bool,
}

fn usable() -> bool {
    true
}

impl ReaderRecord {
    pub fn detection(&self) -> Detection {
        Detection { time_reader_id: self.time_reader_id, tod: self.tod }
    }
}

/// A usable detection, reduced to what the matcher needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub time_reader_id: TimeReaderId,
    pub tod: DateTime<Utc>,
}

/// One athlete's scoring input: identity, wave start and ordered detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteTrace {
    pub athlete_id: AthleteId,
    pub bib: String,
    pub chip: String,
    pub gender: Gender,
    pub category_id: Option<CategoryId>,
    pub wave_start: DateTime<Utc>,
    /// Status currently persisted for the athlete
    pub status: AthleteStatus,
    /// Usable detections, TOD ascending
    pub detections: Vec<Detection>,
}

impl AthleteTrace {
    /// Build a trace for `athlete` from raw reader records.
    ///
    /// Records for other chips and records marked unusable are dropped; the
    /// remainder is sorted by TOD (stable for equal timestamps).
    pub fn from_records<'a>(
        athlete: &Athlete,
        wave_start: DateTime<Utc>,
        records: impl IntoIterator<Item = &'a ReaderRecord>,
    ) -> Self {
        let mut detections: Vec<Detection> = records
            .into_iter()
            .filter(|record| record.can_use && record.chip == athlete.chip)
            .map(ReaderRecord::detection)
            .collect();
        detections.sort_by_key(|d| d.tod);

        Self {
            athlete_id: athlete.id,
            bib: athlete.bib.clone(),
            chip: athlete.chip.clone(),
            gender: athlete.gender,
            category_id: athlete.category_id,
            wave_start,
            status: athlete.status,
            detections,
        }
    }
}
