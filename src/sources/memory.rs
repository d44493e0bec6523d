//! In-memory results store

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{ConfigCache, RaceConfig};
use crate::source::{ResultSink, ResultSource};
use crate::types::{
    Athlete, AthleteId, AthleteSplit, AthleteStatus, AthleteTrace, EventId, RaceId, ReaderRecord,
    Split, SplitId, TimeReaderId,
};
use crate::{Result, TimingError};

#[derive(Debug, Default)]
struct StoreState {
    /// Roster in registration order
    athletes: Vec<Athlete>,
    records: Vec<ReaderRecord>,
    manual: HashMap<AthleteId, Vec<AthleteSplit>>,
    results: HashMap<RaceId, Vec<AthleteSplit>>,
    upserts: usize,
    failing_writes: Option<String>,
}

/// Store that keeps configuration, roster, reads and results in memory.
///
/// It answers [`ResultSource`] queries the way a database-backed collaborator
/// would (usable records only, launched waves only, detections in time order)
/// and records everything written through [`ResultSink`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    config: Arc<ConfigCache>,
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a race configuration, replacing any previous one.
    pub fn save_config(&self, config: &RaceConfig) -> Result<()> {
        self.config.update(config)
    }

    /// Register an athlete, replacing an earlier registration with the same id.
    pub async fn register(&self, athlete: Athlete) {
        let mut state = self.state.lock().await;
        match state.athletes.iter().position(|a| a.id == athlete.id) {
            Some(position) => state.athletes[position] = athlete,
            None => state.athletes.push(athlete),
        }
    }

    /// Append raw reader records.
    pub async fn record(&self, records: impl IntoIterator<Item = ReaderRecord>) {
        let mut state = self.state.lock().await;
        let before = state.records.len();
        state.records.extend(records);
        debug!(added = state.records.len() - before, "Stored reader records");
    }

    /// Enter a manual result, replacing an earlier one for the same split.
    pub async fn set_manual(&self, entry: AthleteSplit) {
        let mut state = self.state.lock().await;
        let entries = state.manual.entry(entry.athlete_id).or_default();
        match entries.iter_mut().find(|e| e.split_id == entry.split_id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    pub async fn athlete(&self, id: AthleteId) -> Option<Athlete> {
        self.state.lock().await.athletes.iter().find(|a| a.id == id).cloned()
    }

    /// Results stored for a race, in first-write order.
    pub async fn results(&self, race_id: RaceId) -> Vec<AthleteSplit> {
        self.state.lock().await.results.get(&race_id).cloned().unwrap_or_default()
    }

    pub async fn result(&self, athlete_id: AthleteId, split_id: SplitId) -> Option<AthleteSplit> {
        let state = self.state.lock().await;
        state
            .results
            .values()
            .flatten()
            .find(|r| r.athlete_id == athlete_id && r.split_id == split_id)
            .cloned()
    }

    /// Number of bulk writes received.
    pub async fn upsert_count(&self) -> usize {
        self.state.lock().await.upserts
    }

    /// Make every following write fail with `reason`, or succeed again with `None`.
    pub async fn fail_writes(&self, reason: Option<String>) {
        self.state.lock().await.failing_writes = reason;
    }

    fn check_writable(state: &StoreState, operation: &str) -> Result<()> {
        match &state.failing_writes {
            Some(reason) => Err(TimingError::sink_failed(operation, reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ResultSource for InMemoryStore {
    async fn launched_events(&self, race_id: RaceId) -> Result<Vec<EventId>> {
        Ok(self.config.launched_events(race_id))
    }

    async fn event_splits(&self, race_id: RaceId, event_id: EventId) -> Result<Vec<Split>> {
        let snapshot = self.config.snapshot();
        if snapshot.event(event_id).is_none_or(|event| event.race_id != race_id) {
            return Ok(Vec::new());
        }
        Ok(snapshot.splits_for_event(event_id).map(|splits| splits.to_vec()).unwrap_or_default())
    }

    async fn event_traces(&self, race_id: RaceId, event_id: EventId) -> Result<Vec<AthleteTrace>> {
        let snapshot = self.config.snapshot();
        let launched: HashMap<_, _> = snapshot
            .waves_for_event(event_id)
            .into_iter()
            .filter(|wave| wave.is_launched)
            .map(|wave| (wave.id, wave.start_time))
            .collect();
        let readers: Vec<TimeReaderId> =
            snapshot.time_readers_for_race(race_id).into_iter().map(|r| r.id).collect();

        let state = self.state.lock().await;
        let mut by_chip: HashMap<&str, Vec<&ReaderRecord>> = HashMap::new();
        for record in state.records.iter().filter(|r| readers.contains(&r.time_reader_id)) {
            by_chip.entry(record.chip.as_str()).or_default().push(record);
        }

        let traces: Vec<AthleteTrace> = state
            .athletes
            .iter()
            .filter(|a| a.race_id == race_id && a.event_id == event_id)
            .filter_map(|athlete| {
                let wave_start = launched.get(&athlete.wave_id)?;
                let records = by_chip.get(athlete.chip.as_str()).into_iter().flatten().copied();
                Some(AthleteTrace::from_records(athlete, *wave_start, records))
            })
            .collect();

        debug!(%event_id, athletes = traces.len(), "Loaded event traces");
        Ok(traces)
    }

    async fn manual_overrides(
        &self,
        race_id: RaceId,
        event_id: EventId,
    ) -> Result<HashMap<AthleteId, Vec<AthleteSplit>>> {
        let state = self.state.lock().await;
        let in_event: Vec<AthleteId> = state
            .athletes
            .iter()
            .filter(|a| a.race_id == race_id && a.event_id == event_id)
            .map(|a| a.id)
            .collect();
        Ok(state
            .manual
            .iter()
            .filter(|(athlete_id, _)| in_event.contains(athlete_id))
            .map(|(athlete_id, entries)| (*athlete_id, entries.clone()))
            .collect())
    }
}

#[async_trait::async_trait]
impl ResultSink for InMemoryStore {
    async fn upsert_results(&self, race_id: RaceId, results: &[AthleteSplit]) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::check_writable(&state, "upsert results")?;

        let stored = state.results.entry(race_id).or_default();
        let mut index: HashMap<(AthleteId, SplitId), usize> = stored
            .iter()
            .enumerate()
            .map(|(position, r)| ((r.athlete_id, r.split_id), position))
            .collect();
        for result in results {
            match index.get(&(result.athlete_id, result.split_id)) {
                Some(&position) => stored[position] = result.clone(),
                None => {
                    index.insert((result.athlete_id, result.split_id), stored.len());
                    stored.push(result.clone());
                }
            }
        }
        state.upserts += 1;

        info!(%race_id, results = results.len(), "Stored race results");
        Ok(())
    }

    async fn update_status(&self, athlete_id: AthleteId, status: AthleteStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::check_writable(&state, "update status")?;

        let athlete = state
            .athletes
            .iter_mut()
            .find(|a| a.id == athlete_id)
            .ok_or_else(|| {
                TimingError::sink_failed("update status", format!("unknown athlete {athlete_id}"))
            })?;
        athlete.status = status;
        Ok(())
    }
}
