//! Manual override merge

use tracing::debug;

use crate::types::{AthleteSplit, AthleteStatus, Split};

/// Replace every computed slot whose split has a manual entry with that entry.
///
/// Manual entries win verbatim and are not checked for consistency; slots
/// without a manual counterpart are left as computed. Returns how many slots
/// were replaced.
pub fn apply_manual_overrides(computed: &mut [AthleteSplit], manual: &[AthleteSplit]) -> usize {
    let mut replaced = 0;
    for slot in computed.iter_mut() {
        if let Some(entry) = manual.iter().find(|m| m.split_id == slot.split_id) {
            *slot = entry.clone();
            replaced += 1;
        }
    }
    if replaced > 0 {
        debug!(replaced, "Applied manual split overrides");
    }
    replaced
}

/// Status implied by an athlete's merged slots.
///
/// `results` must be one slot per split, in the same order as `splits`. A
/// visited finish means finished, any other visited slot means running.
pub fn merged_status(results: &[AthleteSplit], splits: &[Split]) -> AthleteStatus {
    let mut status = AthleteStatus::NotYetStarted;
    for (slot, split) in results.iter().zip(splits) {
        if !slot.is_visited() {
            continue;
        }
        if split.is_finish() {
            return AthleteStatus::Finished;
        }
        status = AthleteStatus::Running;
    }
    status
}
