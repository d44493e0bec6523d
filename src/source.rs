//! Collaborator traits for results computation
//!
//! The engine never talks to storage directly. A [`ResultSource`] answers the
//! queries a recompute needs and a [`ResultSink`] accepts what it produces.

use std::collections::HashMap;

use crate::Result;
use crate::types::{AthleteId, AthleteSplit, AthleteStatus, AthleteTrace, EventId, RaceId, Split};

/// Read side of a results computation.
///
/// Implementations may be backed by a database, a file export or memory. All
/// queries are read-only and must return a consistent view for the duration
/// of one computation.
#[async_trait::async_trait]
pub trait ResultSource: Send + Sync + 'static {
    /// Events of `race_id` with at least one launched wave.
    async fn launched_events(&self, race_id: RaceId) -> Result<Vec<EventId>>;

    /// Splits of an event, in any order.
    ///
    /// Only consulted when the configuration cache holds nothing for the event.
    async fn event_splits(&self, race_id: RaceId, event_id: EventId) -> Result<Vec<Split>>;

    /// Every scoreable athlete of an event.
    ///
    /// Only athletes in launched waves are returned. Their detections must
    /// already be filtered to usable records and sorted by time of day;
    /// athletes without detections are included with an empty list.
    async fn event_traces(&self, race_id: RaceId, event_id: EventId) -> Result<Vec<AthleteTrace>>;

    /// Operator-entered split results, grouped by athlete.
    async fn manual_overrides(
        &self,
        race_id: RaceId,
        event_id: EventId,
    ) -> Result<HashMap<AthleteId, Vec<AthleteSplit>>>;
}

/// Write side of a results computation.
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync + 'static {
    /// Store the complete result set of a race in one write.
    async fn upsert_results(&self, race_id: RaceId, results: &[AthleteSplit]) -> Result<()>;

    /// Persist a status change the transition guard approved.
    async fn update_status(&self, athlete_id: AthleteId, status: AthleteStatus) -> Result<()>;
}
