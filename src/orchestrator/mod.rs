//! Race results orchestration
//!
//! The [`Orchestrator`] drives one computation cycle for a race:
//!
//! 1. ask the [`ResultSource`] for the launched events,
//! 2. per event, load splits (configuration cache first), athlete traces and
//!    manual results, run the matcher, merge the manual results, derive each
//!    athlete's status from the merged slots and check it against the
//!    transition guard,
//! 3. rank the aggregated results,
//! 4. hand them to the [`ResultSink`] in one bulk write, then apply the
//!    approved status changes.
//!
//! Events are computed concurrently up to
//! [`EngineSettings::max_concurrent_events`], but results are collected in
//! event order, so the output never depends on scheduling. Any collaborator
//! failure aborts the cycle before anything is written.

use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ConfigCache, order_splits};
use crate::engine::{SplitMatcher, apply_manual_overrides, assign_ranks, merged_status};
use crate::settings::EngineSettings;
use crate::source::{ResultSink, ResultSource};
use crate::{Result, TimingError};
use crate::types::{
    AthleteId, AthleteSplit, AthleteStatus, EventId, RaceId, Split, is_valid_transition,
};


/// A computed status the guard accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub athlete_id: AthleteId,
    pub from: AthleteStatus,
    pub to: AthleteStatus,
}

/// Ranked results of one event, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EventResults {
    pub event_id: EventId,
    pub athletes: usize,
    /// One entry per (athlete, split), athletes in source order
    pub results: Vec<AthleteSplit>,
    pub status_changes: Vec<StatusChange>,
    /// Computed statuses the guard refused
    pub rejected_transitions: usize,
    pub overrides_applied: usize,
}

impl EventResults {
    fn empty(event_id: EventId) -> Self {
        Self {
            event_id,
            athletes: 0,
            results: Vec::new(),
            status_changes: Vec::new(),
            rejected_transitions: 0,
            overrides_applied: 0,
        }
    }
}

/// Outcome of a committed computation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeReport {
    pub race_id: RaceId,
    pub events: Vec<EventId>,
    pub athletes: usize,
    /// Everything handed to the sink, ranked
    pub results: Vec<AthleteSplit>,
    pub status_changes: Vec<StatusChange>,
    pub rejected_transitions: usize,
    pub overrides_applied: usize,
}

impl RecomputeReport {
    fn from_events(race_id: RaceId, computed: Vec<EventResults>) -> Self {
        let mut report = Self {
            race_id,
            events: Vec::with_capacity(computed.len()),
            athletes: 0,
            results: Vec::new(),
            status_changes: Vec::new(),
            rejected_transitions: 0,
            overrides_applied: 0,
        };
        for event in computed {
            report.events.push(event.event_id);
            report.athletes += event.athletes;
            report.results.extend(event.results);
            report.status_changes.extend(event.status_changes);
            report.rejected_transitions += event.rejected_transitions;
            report.overrides_applied += event.overrides_applied;
        }
        report
    }
}

/// Runs computation cycles against a source and a sink.
pub struct Orchestrator<S, K> {
    source: S,
    sink: K,
    cache: Arc<ConfigCache>,
    matcher: SplitMatcher,
    settings: EngineSettings,
}

impl<S, K> Orchestrator<S, K>
where
    S: ResultSource,
    K: ResultSink,
{
    pub fn new(source: S, sink: K, cache: Arc<ConfigCache>, settings: EngineSettings) -> Self {
        Self {
            source,
            sink,
            cache,
            matcher: SplitMatcher::new(settings.open_window_ceiling),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    /// Recompute, rank and persist every launched event of `race_id`.
    pub async fn recompute_race(&self, race_id: RaceId) -> Result<RecomputeReport> {
        let events = self.source.launched_events(race_id).await?;
        info!(race = %race_id, events = events.len(), "Recomputing race results");

        let computed: Vec<EventResults> = stream::iter(events)
            .map(|event_id| self.compute_event(race_id, event_id))
            .buffered(self.settings.max_concurrent_events.max(1))
            .try_collect()
            .await?;

        self.commit(RecomputeReport::from_events(race_id, computed)).await
    }

    /// Recompute, rank and persist a single launched event.
    pub async fn recompute_event(
        &self,
        race_id: RaceId,
        event_id: EventId,
    ) -> Result<RecomputeReport> {
        if !self.source.launched_events(race_id).await?.contains(&event_id) {
            return Err(TimingError::event_not_found(event_id));
        }
        let computed = self.compute_event(race_id, event_id).await?;
        self.commit(RecomputeReport::from_events(race_id, vec![computed])).await
    }

    /// Compute and rank one event without persisting anything.
    pub async fn compute_event(&self, race_id: RaceId, event_id: EventId) -> Result<EventResults> {
        let splits = self.event_splits(race_id, event_id).await?;
        if splits.is_empty() {
            warn!(event = %event_id, "Event has no splits, nothing to score");
            return Ok(EventResults::empty(event_id));
        }
        let start_split = splits.iter().find(|split| split.is_start());

        let traces = self.source.event_traces(race_id, event_id).await?;
        let manual = self.source.manual_overrides(race_id, event_id).await?;

        let mut computed = EventResults::empty(event_id);
        computed.athletes = traces.len();
        computed.results.reserve(traces.len() * splits.len());

        for trace in &traces {
            let mut outcome = self.matcher.match_athlete(trace, &splits, start_split);
            if let Some(entries) = manual.get(&trace.athlete_id) {
                let replaced = apply_manual_overrides(&mut outcome.splits, entries);
                if replaced > 0 {
                    outcome.status = merged_status(&outcome.splits, &splits);
                }
                computed.overrides_applied += replaced;
            }

            if outcome.status != trace.status {
                if is_valid_transition(trace.status, outcome.status) {
                    computed.status_changes.push(StatusChange {
                        athlete_id: trace.athlete_id,
                        from: trace.status,
                        to: outcome.status,
                    });
                } else {
                    debug!(
                        athlete = %trace.athlete_id,
                        bib = %trace.bib,
                        current = ?trace.status,
                        computed = ?outcome.status,
                        "Status transition rejected"
                    );
                    computed.rejected_transitions += 1;
                }
            }

            computed.results.extend(outcome.splits);
        }

        assign_ranks(&mut computed.results);

        debug!(
            event = %event_id,
            athletes = computed.athletes,
            results = computed.results.len(),
            overrides = computed.overrides_applied,
            "Event computed"
        );
        Ok(computed)
    }

    async fn event_splits(&self, race_id: RaceId, event_id: EventId) -> Result<Arc<[Split]>> {
        if let Some(splits) = self.cache.splits_for_event(event_id) {
            return Ok(splits);
        }
        debug!(event = %event_id, "Splits not cached, asking the source");
        let mut splits = self.source.event_splits(race_id, event_id).await?;
        order_splits(&mut splits);
        Ok(splits.into())
    }

    async fn commit(&self, report: RecomputeReport) -> Result<RecomputeReport> {
        self.sink.upsert_results(report.race_id, &report.results).await?;
        for change in &report.status_changes {
            self.sink.update_status(change.athlete_id, change.to).await?;
        }

        info!(
            race = %report.race_id,
            events = report.events.len(),
            athletes = report.athletes,
            results = report.results.len(),
            status_updates = report.status_changes.len(),
            rejected_transitions = report.rejected_transitions,
            "Race results committed"
        );
        Ok(report)
    }
}
