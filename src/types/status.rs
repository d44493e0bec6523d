//! Athlete participation status and the transition guard
//!
//! The matcher only ever proposes [`AthleteStatus::NotYetStarted`],
//! [`AthleteStatus::Running`] or [`AthleteStatus::Finished`]. The remaining
//! states are administrative and are set outside the engine; the table below
//! keeps the engine from ever walking an athlete back out of them.

use serde::{Deserialize, Serialize};

/// Participation status of an athlete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AthleteStatus {
    #[default]
    NotYetStarted,
    Running,
    Finished,
    Disqualified,
    Quarantine,
    PreRaceWithdrawal,
    WithdrawnDuringRace,
}

use AthleteStatus::*;

/// Allowed `(from, to)` pairs besides the always-allowed no-op transition.
const TRANSITIONS: &[(AthleteStatus, AthleteStatus)] = &[
    (NotYetStarted, Running),
    (NotYetStarted, Finished),
    (NotYetStarted, Disqualified),
    (NotYetStarted, Quarantine),
    (NotYetStarted, PreRaceWithdrawal),
    (Running, Finished),
    (Running, Disqualified),
    (Running, Quarantine),
    (Running, WithdrawnDuringRace),
    (Finished, Disqualified),
    (Finished, Quarantine),
    (Quarantine, Disqualified),
    (PreRaceWithdrawal, Disqualified),
    (WithdrawnDuringRace, Disqualified),
    (WithdrawnDuringRace, Quarantine),
];

impl AthleteStatus {
    /// Every status, in declaration order.
    pub const ALL: [AthleteStatus; 7] = [
        NotYetStarted,
        Running,
        Finished,
        Disqualified,
        Quarantine,
        PreRaceWithdrawal,
        WithdrawnDuringRace,
    ];

    /// Whether this status can only be left through administrative action.
    pub fn is_administrative(self) -> bool {
        matches!(self, Disqualified | Quarantine | PreRaceWithdrawal | WithdrawnDuringRace)
    }

    /// Whether the engine may replace `self` with `next`.
    pub fn can_transition_to(self, next: AthleteStatus) -> bool {
        self == next || TRANSITIONS.contains(&(self, next))
    }
}

/// Guard consulted before a computed status replaces the persisted one.
pub fn is_valid_transition(current: AthleteStatus, proposed: AthleteStatus) -> bool {
    current.can_transition_to(proposed)
}
