//! Race configuration caching
//!
//! The cache keeps an immutable [`ConfigSnapshot`] of every saved race and
//! publishes replacements with an atomic pointer swap. Readers load the current
//! snapshot without locking and keep a consistent view for as long as they hold
//! it; a configuration save builds the next snapshot off to the side (purge the
//! race, insert the new items, rebuild the event index) and swaps it in.

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{RaceConfig, order_splits};
use crate::Result;
use crate::types::{
    Category, CategoryId, Event, EventId, Race, RaceId, Split, SplitId, TimeReader, TimeReaderId,
    Wave, WaveId,
};

/// Immutable view of all cached race configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    version: u64,
    races: HashMap<RaceId, Race>,
    events: HashMap<EventId, Event>,
    categories: HashMap<CategoryId, Category>,
    time_readers: HashMap<TimeReaderId, TimeReader>,
    splits: HashMap<SplitId, Split>,
    waves: HashMap<WaveId, Wave>,
    /// Derived index: event -> splits ordered along the course
    event_splits: HashMap<EventId, Arc<[Split]>>,
}

impl ConfigSnapshot {
    /// Number of configuration saves applied to produce this snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn race(&self, id: RaceId) -> Option<&Race> {
        self.races.get(&id)
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn time_reader(&self, id: TimeReaderId) -> Option<&TimeReader> {
        self.time_readers.get(&id)
    }

    pub fn split(&self, id: SplitId) -> Option<&Split> {
        self.splits.get(&id)
    }

    pub fn wave(&self, id: WaveId) -> Option<&Wave> {
        self.waves.get(&id)
    }

    /// Splits of an event, ordered along the course.
    pub fn splits_for_event(&self, event_id: EventId) -> Option<Arc<[Split]>> {
        self.event_splits.get(&event_id).cloned()
    }

    /// The event's start split, if it has one.
    pub fn start_split_for_event(&self, event_id: EventId) -> Option<&Split> {
        self.event_splits.get(&event_id)?.iter().find(|s| s.is_start())
    }

    pub fn waves_for_event(&self, event_id: EventId) -> Vec<&Wave> {
        let mut waves: Vec<&Wave> = self.waves.values().filter(|w| w.event_id == event_id).collect();
        waves.sort_by_key(|w| (w.start_time, w.id));
        waves
    }

    pub fn categories_for_event(&self, event_id: EventId) -> Vec<&Category> {
        let mut categories: Vec<&Category> =
            self.categories.values().filter(|c| c.event_id == event_id).collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        categories
    }

    pub fn events_for_race(&self, race_id: RaceId) -> Vec<&Event> {
        let mut events: Vec<&Event> =
            self.events.values().filter(|e| e.race_id == race_id).collect();
        events.sort_by_key(|e| (e.date, e.id));
        events
    }

    pub fn time_readers_for_race(&self, race_id: RaceId) -> Vec<&TimeReader> {
        let mut readers: Vec<&TimeReader> =
            self.time_readers.values().filter(|r| r.race_id == race_id).collect();
        readers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        readers
    }

    /// Events of the race with at least one launched wave.
    pub fn launched_events(&self, race_id: RaceId) -> Vec<EventId> {
        self.events_for_race(race_id)
            .into_iter()
            .filter(|event| self.waves.values().any(|w| w.event_id == event.id && w.is_launched))
            .map(|event| event.id)
            .collect()
    }

    fn purge_race(&mut self, race_id: RaceId) {
        let events: Vec<EventId> =
            self.events.values().filter(|e| e.race_id == race_id).map(|e| e.id).collect();

        self.races.remove(&race_id);
        self.time_readers.retain(|_, r| r.race_id != race_id);
        self.events.retain(|_, e| e.race_id != race_id);
        self.categories.retain(|_, c| !events.contains(&c.event_id));
        self.splits.retain(|_, s| !events.contains(&s.event_id));
        self.waves.retain(|_, w| !events.contains(&w.event_id));
        for event_id in &events {
            self.event_splits.remove(event_id);
        }
    }

    fn insert_race(&mut self, config: &RaceConfig) {
        self.races.insert(config.race.id, config.race.clone());
        self.events.extend(config.events.iter().map(|e| (e.id, e.clone())));
        self.categories.extend(config.categories.iter().map(|c| (c.id, c.clone())));
        self.time_readers.extend(config.time_readers.iter().map(|r| (r.id, r.clone())));
        self.splits.extend(config.splits.iter().map(|s| (s.id, s.clone())));
        self.waves.extend(config.waves.iter().map(|w| (w.id, w.clone())));

        let mut by_event: HashMap<EventId, Vec<Split>> = HashMap::new();
        for split in &config.splits {
            by_event.entry(split.event_id).or_default().push(split.clone());
        }
        for (event_id, mut splits) in by_event {
            order_splits(&mut splits);
            self.event_splits.insert(event_id, splits.into());
        }
    }
}

/// Concurrency-safe cache of race configuration.
///
/// Reads are lock-free; [`ConfigCache::update`] replaces one race wholesale.
#[derive(Debug, Default)]
pub struct ConfigCache {
    current: ArcSwap<ConfigSnapshot>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot; hold it to get a consistent view across several lookups.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Replace everything cached for `config.race` with `config`.
    ///
    /// Invalid configuration is rejected and the cache is left untouched.
    pub fn update(&self, config: &RaceConfig) -> Result<()> {
        config.validate()?;

        let race_id = config.race.id;
        self.current.rcu(|current| {
            let mut next = ConfigSnapshot::clone(current);
            next.purge_race(race_id);
            next.insert_race(config);
            next.version += 1;
            next
        });

        info!(
            race = %race_id,
            version = self.version(),
            events = config.events.len(),
            splits = config.splits.len(),
            waves = config.waves.len(),
            "Race configuration replaced"
        );
        Ok(())
    }

    /// Drop a race and everything scoped to it.
    pub fn remove_race(&self, race_id: RaceId) {
        self.current.rcu(|current| {
            let mut next = ConfigSnapshot::clone(current);
            next.purge_race(race_id);
            next.version += 1;
            next
        });
        debug!(race = %race_id, "Race configuration removed");
    }

    pub fn race(&self, id: RaceId) -> Option<Race> {
        self.current.load().race(id).cloned()
    }

    pub fn event(&self, id: EventId) -> Option<Event> {
        self.current.load().event(id).cloned()
    }

    pub fn split(&self, id: SplitId) -> Option<Split> {
        self.current.load().split(id).cloned()
    }

    pub fn wave(&self, id: WaveId) -> Option<Wave> {
        self.current.load().wave(id).cloned()
    }

    pub fn time_reader(&self, id: TimeReaderId) -> Option<TimeReader> {
        self.current.load().time_reader(id).cloned()
    }

    pub fn category(&self, id: CategoryId) -> Option<Category> {
        self.current.load().category(id).cloned()
    }

    pub fn splits_for_event(&self, event_id: EventId) -> Option<Arc<[Split]>> {
        self.current.load().splits_for_event(event_id)
    }

    pub fn start_split_for_event(&self, event_id: EventId) -> Option<Split> {
        self.current.load().start_split_for_event(event_id).cloned()
    }

    pub fn waves_for_event(&self, event_id: EventId) -> Vec<Wave> {
        self.current.load().waves_for_event(event_id).into_iter().cloned().collect()
    }

    pub fn categories_for_event(&self, event_id: EventId) -> Vec<Category> {
        self.current.load().categories_for_event(event_id).into_iter().cloned().collect()
    }

    pub fn events_for_race(&self, race_id: RaceId) -> Vec<Event> {
        self.current.load().events_for_race(race_id).into_iter().cloned().collect()
    }

    pub fn time_readers_for_race(&self, race_id: RaceId) -> Vec<TimeReader> {
        self.current.load().time_readers_for_race(race_id).into_iter().cloned().collect()
    }

    pub fn launched_events(&self, race_id: RaceId) -> Vec<EventId> {
        self.current.load().launched_events(race_id)
    }
}
