//! # Race Configuration
//!
//! A [`RaceConfig`] is the whole configuration of one race as it is saved by the
//! timing desk: events, categories, time readers, splits and waves. Saving a
//! configuration always replaces the previous one for that race, so the type is
//! the unit of both validation and caching.
//!
//! ## Document Format
//!
//! ```text
//! Race:
//!   Id: 7d1c...            # UUIDs throughout
//!   Name: City Marathon
//!   Timezone: Europe/Madrid
//! Events:
//!   - { Id: ..., RaceId: ..., Name: Marathon, Distance: 42195, Date: 2026-05-03 }
//! TimeReaders:
//!   - { Id: ..., RaceId: ..., Name: Start mat }
//! Splits:
//!   - Id: ...
//!     EventId: ...
//!     Kind: finish          # start | standard | finish
//!     TimeReaderId: ...
//!     MinTime: 300          # seconds after wave start
//!     MaxTime: 0            # 0 = unbounded
//!     MinLapTime: 0
//!     PreviousLapSplitId: ~
//! Waves:
//!   - { Id: ..., EventId: ..., StartTime: 2026-05-03T08:00:00Z, IsLaunched: true }
//! ```
//!
//! ## Validation
//!
//! Structural mistakes (dangling references, missing start split, inverted
//! windows) are rejected by [`RaceConfig::validate`] before a configuration
//! reaches the cache, so the matcher can assume a well-formed course.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::types::{Category, Event, EventId, Race, Split, SplitKind, TimeReader, Wave};
use crate::yaml_utils::preprocess_config_yaml;
use crate::{Result, TimingError};

pub mod cache;

pub use cache::{ConfigCache, ConfigSnapshot};

/// Complete configuration of one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaceConfig {
    pub race: Race,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub time_readers: Vec<TimeReader>,
    #[serde(default)]
    pub splits: Vec<Split>,
    #[serde(default)]
    pub waves: Vec<Wave>,
}

impl RaceConfig {
    /// Empty configuration for `race`.
    pub fn new(race: Race) -> Self {
        Self {
            race,
            events: Vec::new(),
            categories: Vec::new(),
            time_readers: Vec::new(),
            splits: Vec::new(),
            waves: Vec::new(),
        }
    }

    /// Parse and validate a YAML race configuration.
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        let cleaned = preprocess_config_yaml(yaml)?;
        let config: RaceConfig = serde_yaml_ng::from_str(&cleaned)
            .map_err(TimingError::from)
            .context("race configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Splits of `event_id`, ordered along the course.
    pub fn splits_for_event(&self, event_id: EventId) -> Vec<Split> {
        let mut splits: Vec<Split> =
            self.splits.iter().filter(|s| s.event_id == event_id).cloned().collect();
        order_splits(&mut splits);
        splits
    }

    /// Reject structurally invalid configuration.
    pub fn validate(&self) -> Result<()> {
        let race_id = self.race.id;

        ensure_unique("event", self.events.iter().map(|e| e.id))?;
        ensure_unique("category", self.categories.iter().map(|c| c.id))?;
        ensure_unique("time reader", self.time_readers.iter().map(|r| r.id))?;
        ensure_unique("split", self.splits.iter().map(|s| s.id))?;
        ensure_unique("wave", self.waves.iter().map(|w| w.id))?;

        for event in &self.events {
            if event.race_id != race_id {
                return Err(TimingError::invalid_config(
                    "event",
                    event.id,
                    format!("belongs to race {} instead of {}", event.race_id, race_id),
                ));
            }
        }
        for reader in &self.time_readers {
            if reader.race_id != race_id {
                return Err(TimingError::invalid_config(
                    "time reader",
                    reader.id,
                    format!("belongs to race {} instead of {}", reader.race_id, race_id),
                ));
            }
        }

        let events: HashSet<_> = self.events.iter().map(|e| e.id).collect();
        let readers: HashSet<_> = self.time_readers.iter().map(|r| r.id).collect();
        let split_events: HashMap<_, _> = self.splits.iter().map(|s| (s.id, s.event_id)).collect();

        for category in &self.categories {
            if !events.contains(&category.event_id) {
                return Err(TimingError::invalid_config(
                    "category",
                    category.id,
                    format!("references unknown event {}", category.event_id),
                ));
            }
        }
        for wave in &self.waves {
            if !events.contains(&wave.event_id) {
                return Err(TimingError::invalid_config(
                    "wave",
                    wave.id,
                    format!("references unknown event {}", wave.event_id),
                ));
            }
        }

        for split in &self.splits {
            if !events.contains(&split.event_id) {
                return Err(TimingError::invalid_config(
                    "split",
                    split.id,
                    format!("references unknown event {}", split.event_id),
                ));
            }
            if !readers.contains(&split.time_reader_id) {
                return Err(TimingError::invalid_config(
                    "split",
                    split.id,
                    format!("time reader {} is not part of this race", split.time_reader_id),
                ));
            }
            if !split.max_time.is_zero() && split.max_time < split.min_time {
                return Err(TimingError::invalid_config(
                    "split",
                    split.id,
                    format!("max time {:?} is before min time {:?}", split.max_time, split.min_time),
                ));
            }
            if let Some(previous) = split.previous_lap_split_id {
                if previous == split.id {
                    return Err(TimingError::invalid_config(
                        "split",
                        split.id,
                        "previous-lap split references itself",
                    ));
                }
                match split_events.get(&previous) {
                    Some(event_id) if *event_id == split.event_id => {}
                    Some(_) => {
                        return Err(TimingError::invalid_config(
                            "split",
                            split.id,
                            format!("previous-lap split {} belongs to another event", previous),
                        ));
                    }
                    None => {
                        return Err(TimingError::invalid_config(
                            "split",
                            split.id,
                            format!("previous-lap split {} does not exist", previous),
                        ));
                    }
                }
            }
        }

        let previous_laps: HashMap<_, _> = self
            .splits
            .iter()
            .filter_map(|s| s.previous_lap_split_id.map(|previous| (s.id, previous)))
            .collect();
        for split in &self.splits {
            let mut visited = HashSet::from([split.id]);
            let mut cursor = split.id;
            while let Some(&previous) = previous_laps.get(&cursor) {
                if !visited.insert(previous) {
                    return Err(TimingError::invalid_config(
                        "split",
                        split.id,
                        "previous-lap chain forms a cycle",
                    ));
                }
                cursor = previous;
            }
        }

        for event in &self.events {
            let mut total = 0usize;
            let mut starts = 0usize;
            for split in self.splits.iter().filter(|s| s.event_id == event.id) {
                total += 1;
                if split.kind == SplitKind::Start {
                    starts += 1;
                }
            }
            if total > 0 && starts != 1 {
                return Err(TimingError::invalid_config(
                    "event",
                    event.id,
                    format!("expected exactly one start split, found {}", starts),
                ));
            }
        }

        Ok(())
    }
}

/// Order splits along the course; equal distances keep configuration order.
pub fn order_splits(splits: &mut [Split]) {
    splits.sort_by(|a, b| a.distance_from_start.total_cmp(&b.distance_from_start));
}

fn ensure_unique<T>(entity: &'static str, ids: impl Iterator<Item = T>) -> Result<()>
where
    T: Eq + Hash + ToString,
{
    let mut seen = HashSet::new();
    for id in ids {
        let label = id.to_string();
        if !seen.insert(id) {
            return Err(TimingError::invalid_config(entity, label, "duplicate id"));
        }
    }
    Ok(())
}
