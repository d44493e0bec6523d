//! Computed per-athlete split results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::athlete::{AthleteTrace, Gender};
use super::ids::{AthleteId, CategoryId, EventId, SplitId};
use super::course::Split;
use crate::yaml_utils::duration_secs;

/// Time basis a ranking is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBasis {
    Gun,
    Net,
}

impl TimeBasis {
    pub const ALL: [TimeBasis; 2] = [TimeBasis::Gun, TimeBasis::Net];
}

/// Crossing time and the elapsed times derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SplitTiming {
    pub tod: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub gun_time: Duration,
    #[serde(with = "duration_secs")]
    pub net_time: Duration,
}

impl SplitTiming {
    pub fn time(&self, basis: TimeBasis) -> Duration {
        match basis {
            TimeBasis::Gun => self.gun_time,
            TimeBasis::Net => self.net_time,
        }
    }
}

/// Whether, and how, an athlete passed a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "Source", rename_all = "kebab-case")]
pub enum Passage {
    #[default]
    NotVisited,
    /// Matched from a reader detection
    Detected(SplitTiming),
    /// Entered by an operator
    Manual(SplitTiming),
}

impl Passage {
    pub fn timing(&self) -> Option<&SplitTiming> {
        match self {
            Passage::NotVisited => None,
            Passage::Detected(timing) | Passage::Manual(timing) => Some(timing),
        }
    }
}

/// Ranks within the three scopes for one time basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ranks {
    pub overall: Option<u32>,
    pub gender: Option<u32>,
    pub category: Option<u32>,
}

/// Result of one athlete at one split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AthleteSplit {
    pub athlete_id: AthleteId,
    pub split_id: SplitId,
    pub event_id: EventId,
    pub category_id: Option<CategoryId>,
    pub gender: Gender,
    #[serde(default)]
    pub passage: Passage,
    #[serde(default)]
    pub gun_ranks: Ranks,
    #[serde(default)]
    pub net_ranks: Ranks,
}

impl AthleteSplit {
    /// Not-visited slot for `trace` at `split`.
    pub fn template(trace: &AthleteTrace, split: &Split) -> Self {
        Self {
            athlete_id: trace.athlete_id,
            split_id: split.id,
            event_id: split.event_id,
            category_id: trace.category_id,
            gender: trace.gender,
            passage: Passage::NotVisited,
            gun_ranks: Ranks::default(),
            net_ranks: Ranks::default(),
        }
    }

    pub fn is_visited(&self) -> bool {
        self.passage.timing().is_some()
    }

    pub fn timing(&self) -> Option<&SplitTiming> {
        self.passage.timing()
    }

    pub fn tod(&self) -> Option<DateTime<Utc>> {
        self.timing().map(|t| t.tod)
    }

    pub fn time(&self, basis: TimeBasis) -> Option<Duration> {
        self.timing().map(|t| t.time(basis))
    }

    pub fn ranks(&self, basis: TimeBasis) -> &Ranks {
        match basis {
            TimeBasis::Gun => &self.gun_ranks,
            TimeBasis::Net => &self.net_ranks,
        }
    }

    pub fn ranks_mut(&mut self, basis: TimeBasis) -> &mut Ranks {
        match basis {
            TimeBasis::Gun => &mut self.gun_ranks,
            TimeBasis::Net => &mut self.net_ranks,
        }
    }
}
