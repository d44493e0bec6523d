//! Split matching: raw detections to per-split results for one athlete
//!
//! Detections are walked in time order and every detection is offered to every
//! split read by the same mat, because one physical mat may serve several
//! splits (start line, each lap, finish). A split takes a detection when:
//!
//! - the detection falls inside the split's `[min_time, max_time]` window
//!   measured from the wave start (inclusive; zero `max_time` is unbounded),
//! - for lap-chained splits, the previous-lap split already has a result and at
//!   least `min_lap_time` has elapsed since it,
//! - the slot is still empty, or the split is a start split (the last valid
//!   start read wins; every other split keeps its first valid read).
//!
//! A finish result ends the athlete's race: nothing after it is considered.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;

use crate::types::{
    AthleteSplit, AthleteStatus, AthleteTrace, Detection, Passage, Split, SplitId, SplitTiming,
    clock,
};

/// Ceiling applied to splits configured with an unbounded (zero) `max_time`.
pub const DEFAULT_OPEN_WINDOW_CEILING: Duration = Duration::from_secs(10 * 24 * 60 * 60);

/// Per-split results for one athlete plus the status they imply.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// One entry per configured split, in split order
    pub splits: Vec<AthleteSplit>,
    pub status: AthleteStatus,
}

/// Matches an athlete's detections against an event's splits.
#[derive(Debug, Clone, Copy)]
pub struct SplitMatcher {
    open_window_ceiling: Duration,
}

impl Default for SplitMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_OPEN_WINDOW_CEILING)
    }
}

impl SplitMatcher {
    pub fn new(open_window_ceiling: Duration) -> Self {
        Self { open_window_ceiling }
    }

    pub fn open_window_ceiling(&self) -> Duration {
        self.open_window_ceiling
    }

    /// Compute every split result for `trace`.
    ///
    /// `splits` must be the event's splits in course order and `start_split`
    /// the event's designated start split, if any.
    pub fn match_athlete(
        &self,
        trace: &AthleteTrace,
        splits: &[Split],
        start_split: Option<&Split>,
    ) -> MatchOutcome {
        let mut results: Vec<AthleteSplit> =
            splits.iter().map(|split| AthleteSplit::template(trace, split)).collect();

        if trace.detections.is_empty() {
            return MatchOutcome { splits: results, status: AthleteStatus::NotYetStarted };
        }

        let start_slot =
            start_split.and_then(|start| splits.iter().position(|split| split.id == start.id));
        let mut crossed: HashMap<SplitId, DateTime<Utc>> = HashMap::with_capacity(splits.len());
        let mut status = AthleteStatus::NotYetStarted;

        let mut detections: Vec<&Detection> = trace.detections.iter().collect();
        detections.sort_by_key(|d| d.tod);

        'detections: for detection in detections {
            for (slot, split) in splits.iter().enumerate() {
                if split.time_reader_id != detection.time_reader_id {
                    continue;
                }
                if !split.in_window(detection.tod, trace.wave_start, self.open_window_ceiling) {
                    continue;
                }
                if let Some(previous) = split.previous_lap_split_id {
                    let Some(anchor) = crossed.get(&previous) else {
                        continue;
                    };
                    match clock::elapsed(*anchor, detection.tod) {
                        Some(lap) if lap >= split.min_lap_time => {}
                        _ => continue,
                    }
                }
                if results[slot].is_visited() && !split.is_start() {
                    continue;
                }

                let gun_time = clock::elapsed(trace.wave_start, detection.tod).unwrap_or_default();
                let net_time = if split.is_start() {
                    Duration::ZERO
                } else {
                    match start_slot.and_then(|index| results[index].tod()) {
                        Some(start_tod) => {
                            clock::elapsed(start_tod, detection.tod).unwrap_or_default()
                        }
                        None => gun_time,
                    }
                };

                results[slot].passage =
                    Passage::Detected(SplitTiming { tod: detection.tod, gun_time, net_time });
                crossed.insert(split.id, detection.tod);

                trace!(
                    athlete = %trace.athlete_id,
                    split = %split.id,
                    tod = %detection.tod,
                    ?gun_time,
                    ?net_time,
                    "Detection accepted"
                );

                if split.is_finish() {
                    status = AthleteStatus::Finished;
                    break 'detections;
                }
                status = AthleteStatus::Running;
            }
        }

        MatchOutcome { splits: results, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Course, CourseBuilder, LapCourse, hms};
    use crate::types::{Gender, TimeReaderId};

    fn run(course: &Course, detections: &[(TimeReaderId, DateTime<Utc>)]) -> MatchOutcome {
        let trace = course.trace(1, Gender::Female, None, detections);
        let splits = course.splits();
        let start = course.start_split();
        SplitMatcher::default().match_athlete(&trace, &splits, Some(&start))
    }

    fn slot(outcome: &MatchOutcome, id: SplitId) -> &AthleteSplit {
        outcome.splits.iter().find(|s| s.split_id == id).expect("slot exists")
    }

    #[test]
    fn scenario_start_and_finish() {
        let c = CourseBuilder::ten_k();
        let outcome = run(&c, &[(c.start_reader, hms(8, 0, 0)), (c.finish_reader, hms(8, 10, 0))]);

        let start = slot(&outcome, c.start).timing().copied().unwrap();
        assert_eq!(start.gun_time, Duration::ZERO);
        assert_eq!(start.net_time, Duration::ZERO);

        let finish = slot(&outcome, c.finish).timing().copied().unwrap();
        assert_eq!(finish.gun_time, Duration::from_secs(600));
        assert_eq!(finish.net_time, Duration::from_secs(600));
        assert_eq!(outcome.status, AthleteStatus::Finished);
        assert!(!slot(&outcome, c.km5).is_visited());
    }

    #[test]
    fn scenario_duplicate_checkpoint_without_start() {
        let c = CourseBuilder::ten_k();
        let outcome = run(&c, &[(c.km5_reader, hms(8, 4, 59)), (c.km5_reader, hms(8, 5, 0))]);

        let km5 = slot(&outcome, c.km5).timing().copied().unwrap();
        assert_eq!(km5.tod, hms(8, 4, 59));
        assert_eq!(km5.gun_time, Duration::from_secs(299));
        assert_eq!(km5.net_time, km5.gun_time);
        assert_eq!(outcome.status, AthleteStatus::Running);
        assert!(!slot(&outcome, c.start).is_visited());
    }

    #[test]
    fn scenario_no_detections() {
        let c = CourseBuilder::ten_k();
        let outcome = run(&c, &[]);
        assert_eq!(outcome.splits.len(), 3);
        assert!(outcome.splits.iter().all(|s| !s.is_visited()));
        assert_eq!(outcome.status, AthleteStatus::NotYetStarted);
    }

    #[test]
    fn template_follows_split_order() {
        let c = CourseBuilder::ten_k();
        let outcome = run(&c, &[]);
        let ids: Vec<_> = outcome.splits.iter().map(|s| s.split_id).collect();
        assert_eq!(ids, vec![c.start, c.km5, c.finish]);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let c = CourseBuilder::ten_k();
        // km5 opens 180 s after the gun
        let early = run(&c, &[(c.km5_reader, c.after(179))]);
        assert!(!slot(&early, c.km5).is_visited());
        assert_eq!(early.status, AthleteStatus::NotYetStarted);

        let on_edge = run(&c, &[(c.km5_reader, c.after(180))]);
        assert!(slot(&on_edge, c.km5).is_visited());

        // start closes 1800 s after the gun
        let last = run(&c, &[(c.start_reader, c.after(1800))]);
        assert!(slot(&last, c.start).is_visited());
        let late = run(&c, &[(c.start_reader, c.after(1801))]);
        assert!(!slot(&late, c.start).is_visited());
    }

    #[test]
    fn unbounded_window_respects_ceiling() {
        let c = CourseBuilder::ten_k();
        let trace = c.trace(1, Gender::Male, None, &[(c.finish_reader, c.after(7_200))]);
        let splits = c.splits();
        let tight = SplitMatcher::new(Duration::from_secs(3_600));
        let outcome = tight.match_athlete(&trace, &splits, None);
        assert!(outcome.splits.iter().all(|s| !s.is_visited()));

        let outcome = SplitMatcher::default().match_athlete(&trace, &splits, None);
        assert_eq!(outcome.status, AthleteStatus::Finished);
    }

    #[test]
    fn later_start_read_overwrites() {
        let c = CourseBuilder::ten_k();
        let outcome = run(&c, &[(c.start_reader, c.after(5)), (c.start_reader, c.after(40))]);
        assert_eq!(slot(&outcome, c.start).tod(), Some(c.after(40)));
        assert_eq!(outcome.status, AthleteStatus::Running);
    }

    #[test]
    fn standard_split_keeps_first_read() {
        let c = CourseBuilder::ten_k();
        let outcome = run(&c, &[(c.km5_reader, c.after(1500)), (c.km5_reader, c.after(1510))]);
        assert_eq!(slot(&outcome, c.km5).tod(), Some(c.after(1500)));
    }

    #[test]
    fn net_time_is_measured_from_own_start() {
        let c = CourseBuilder::ten_k();
        let outcome = run(
            &c,
            &[
                (c.start_reader, c.after(45)),
                (c.km5_reader, c.after(1545)),
                (c.finish_reader, c.after(3045)),
            ],
        );
        let finish = slot(&outcome, c.finish).timing().copied().unwrap();
        assert_eq!(finish.gun_time, Duration::from_secs(3045));
        assert_eq!(finish.net_time, Duration::from_secs(3000));
        let km5 = slot(&outcome, c.km5).timing().copied().unwrap();
        assert_eq!(km5.net_time, Duration::from_secs(1500));
    }

    #[test]
    fn finish_short_circuits_everything_after() {
        let c = CourseBuilder::ten_k();
        let outcome = run(
            &c,
            &[
                (c.start_reader, c.after(10)),
                (c.finish_reader, c.after(1000)),
                (c.km5_reader, c.after(1100)),
                (c.start_reader, c.after(1500)),
            ],
        );
        // the start read at 1500 s is still inside the start window but comes after the finish
        assert_eq!(slot(&outcome, c.start).tod(), Some(c.after(10)));
        assert!(!slot(&outcome, c.km5).is_visited());
        assert_eq!(outcome.status, AthleteStatus::Finished);
    }

    #[test]
    fn unordered_input_is_processed_in_time_order() {
        let c = CourseBuilder::ten_k();
        let mut trace = c.trace(
            1,
            Gender::Male,
            None,
            &[(c.km5_reader, c.after(1500)), (c.km5_reader, c.after(1490))],
        );
        trace.detections.reverse();
        let outcome = SplitMatcher::default().match_athlete(&trace, &c.splits(), None);
        assert_eq!(slot(&outcome, c.km5).tod(), Some(c.after(1490)));
    }

    #[test]
    fn missing_start_split_falls_back_to_gun_time() {
        let c = CourseBuilder::ten_k();
        let trace = c.trace(
            1,
            Gender::Male,
            None,
            &[(c.start_reader, c.after(30)), (c.finish_reader, c.after(3030))],
        );
        let outcome = SplitMatcher::default().match_athlete(&trace, &c.splits(), None);
        let finish = slot(&outcome, c.finish).timing().copied().unwrap();
        assert_eq!(finish.net_time, finish.gun_time);
    }

    #[test]
    fn laps_respect_minimum_lap_time() {
        let course = LapCourse::new(3, 120);
        let splits = course.splits();
        let start = course.start_split();
        // start, a re-read inside the start window, lap 1, a duplicate of lap 1, lap 2
        let trace = course.trace(&[0, 30, 200, 210, 400]);
        let outcome = SplitMatcher::default().match_athlete(&trace, &splits, Some(&start));

        let tod = |id: SplitId| outcome.splits.iter().find(|s| s.split_id == id).unwrap().tod();
        assert_eq!(tod(course.start), Some(course.wave_start + chrono::TimeDelta::seconds(30)));
        assert_eq!(tod(course.laps[0]), Some(course.wave_start + chrono::TimeDelta::seconds(200)));
        assert_eq!(tod(course.laps[1]), Some(course.wave_start + chrono::TimeDelta::seconds(400)));
        assert_eq!(tod(course.finish), None);
        assert_eq!(outcome.status, AthleteStatus::Running);

        let trace = course.trace(&[0, 200, 400, 600]);
        let outcome = SplitMatcher::default().match_athlete(&trace, &splits, Some(&start));
        assert_eq!(outcome.status, AthleteStatus::Finished);
        let finish = outcome.splits.iter().find(|s| s.split_id == course.finish).unwrap();
        assert_eq!(finish.timing().unwrap().net_time, Duration::from_secs(600));
    }

    #[test]
    fn lap_split_never_takes_the_anchor_detection_itself() {
        let course = LapCourse::new(2, 60);
        let splits = course.splits();
        let trace = course.trace(&[0]);
        let outcome =
            SplitMatcher::default().match_athlete(&trace, &splits, Some(&course.start_split()));
        assert_eq!(outcome.splits.iter().filter(|s| s.is_visited()).count(), 1);
    }

    #[test]
    fn dangling_previous_lap_reference_is_never_eligible() {
        let c = CourseBuilder::ten_k();
        let mut splits = c.splits();
        splits[1].previous_lap_split_id = Some(SplitId::from_u128(0xdead));
        let trace = c.trace(1, Gender::Male, None, &[(c.km5_reader, c.after(1500))]);
        let outcome = SplitMatcher::default().match_athlete(&trace, &splits, None);
        assert!(!outcome.splits[1].is_visited());
        assert_eq!(outcome.status, AthleteStatus::NotYetStarted);
    }

    #[test]
    fn zero_min_lap_time_allows_same_detection() {
        let course = LapCourse::new(2, 0);
        let trace = course.trace(&[10]);
        let splits = course.splits();
        let outcome =
            SplitMatcher::default().match_athlete(&trace, &splits, Some(&course.start_split()));
        // with no lap floor one read satisfies the start, the lap and the finish
        assert_eq!(outcome.status, AthleteStatus::Finished);
        assert_eq!(outcome.splits.iter().filter(|s| s.is_visited()).count(), 3);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_detections() -> impl Strategy<Value = Vec<(TimeReaderId, i64)>> {
            let c = CourseBuilder::ten_k();
            let readers = vec![c.start_reader, c.km5_reader, c.finish_reader];
            prop::collection::vec((prop::sample::select(readers), -120i64..8_000), 0..12)
        }

        fn build(c: &Course, reads: &[(TimeReaderId, i64)]) -> AthleteTrace {
            let detections: Vec<_> = reads.iter().map(|(r, s)| (*r, c.after(*s))).collect();
            c.trace(3, Gender::NonBinary, Some(c.open_category), &detections)
        }

        proptest! {
            #[test]
            fn prop_gun_time_never_below_net_time(reads in arb_detections()) {
                let c = CourseBuilder::ten_k();
                let outcome = SplitMatcher::default()
                    .match_athlete(&build(&c, &reads), &c.splits(), Some(&c.start_split()));
                for result in &outcome.splits {
                    if let Some(timing) = result.timing() {
                        prop_assert!(timing.gun_time >= timing.net_time);
                    }
                }
            }

            #[test]
            fn prop_matching_is_idempotent(reads in arb_detections()) {
                let c = CourseBuilder::ten_k();
                let trace = build(&c, &reads);
                let matcher = SplitMatcher::default();
                let first = matcher.match_athlete(&trace, &c.splits(), Some(&c.start_split()));
                let second = matcher.match_athlete(&trace, &c.splits(), Some(&c.start_split()));
                prop_assert_eq!(first, second);
            }

            #[test]
            fn prop_nothing_after_finish_matters(
                reads in arb_detections(),
                extra in prop::collection::vec(0i64..2_000, 0..6),
            ) {
                let c = CourseBuilder::ten_k();
                let matcher = SplitMatcher::default();
                let base = matcher.match_athlete(&build(&c, &reads), &c.splits(), Some(&c.start_split()));
                let finish_tod = base.splits.iter().find(|s| s.split_id == c.finish).and_then(|s| s.tod());
                if let Some(finish_tod) = finish_tod {
                    let offset = (finish_tod - c.wave_start).num_seconds();
                    let mut noisy = reads.clone();
                    for (i, delta) in extra.iter().enumerate() {
                        let reader = [c.start_reader, c.km5_reader, c.finish_reader][i % 3];
                        noisy.push((reader, offset + 1 + delta));
                    }
                    let again = matcher.match_athlete(&build(&c, &noisy), &c.splits(), Some(&c.start_split()));
                    prop_assert_eq!(base, again);
                }
            }

            #[test]
            fn prop_results_always_inside_window(reads in arb_detections()) {
                let c = CourseBuilder::ten_k();
                let splits = c.splits();
                let outcome = SplitMatcher::default()
                    .match_athlete(&build(&c, &reads), &splits, Some(&c.start_split()));
                for (split, result) in splits.iter().zip(&outcome.splits) {
                    if let Some(tod) = result.tod() {
                        prop_assert!(split.in_window(tod, c.wave_start, DEFAULT_OPEN_WINDOW_CEILING));
                    }
                }
            }
        }
    }
}
