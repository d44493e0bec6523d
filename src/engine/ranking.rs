//! Multi-scope ranking on gun and net time
//!
//! For each time basis the visited results are sorted by that time (stable, so
//! equal times keep input order) and numbered with one running counter per
//! split for the overall scope, per `(gender, split)` and per
//! `(category, split)`. Ranks are strictly sequential: equal times never share
//! a rank. Results that were never visited are left unranked.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::types::{AthleteSplit, CategoryId, Gender, Ranks, SplitId, TimeBasis};

/// Assign gun and net ranks to every visited result, in place.
pub fn assign_ranks(results: &mut [AthleteSplit]) {
    for basis in TimeBasis::ALL {
        rank_on(results, basis);
    }
}

fn rank_on(results: &mut [AthleteSplit], basis: TimeBasis) {
    let mut order: Vec<(usize, Duration)> = results
        .iter()
        .enumerate()
        .filter_map(|(index, result)| result.time(basis).map(|time| (index, time)))
        .collect();
    order.sort_by_key(|(_, time)| *time);

    for result in results.iter_mut() {
        *result.ranks_mut(basis) = Ranks::default();
    }

    let mut overall: HashMap<SplitId, u32> = HashMap::new();
    let mut by_gender: HashMap<(Gender, SplitId), u32> = HashMap::new();
    let mut by_category: HashMap<(CategoryId, SplitId), u32> = HashMap::new();

    for (index, _) in order {
        let result = &mut results[index];
        let split = result.split_id;
        let ranks = Ranks {
            overall: Some(next_rank(&mut overall, split)),
            gender: Some(next_rank(&mut by_gender, (result.gender, split))),
            category: result.category_id.map(|category| next_rank(&mut by_category, (category, split))),
        };
        *result.ranks_mut(basis) = ranks;
    }
}

fn next_rank<K: Eq + Hash>(counters: &mut HashMap<K, u32>, key: K) -> u32 {
    let counter = counters.entry(key).or_insert(0);
    *counter += 1;
    *counter
}

/// Ranked results of one split, best first.
pub fn leaderboard(
    results: &[AthleteSplit],
    split_id: SplitId,
    basis: TimeBasis,
) -> Vec<&AthleteSplit> {
    let mut board: Vec<&AthleteSplit> = results
        .iter()
        .filter(|r| r.split_id == split_id && r.ranks(basis).overall.is_some())
        .collect();
    board.sort_by_key(|r| r.ranks(basis).overall);
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SplitMatcher;
    use crate::test_utils::{Course, CourseBuilder};
    use crate::types::{AthleteTrace, Gender};
    use std::collections::BTreeMap;

    fn compute(course: &Course, traces: &[AthleteTrace]) -> Vec<AthleteSplit> {
        let matcher = SplitMatcher::default();
        let splits = course.splits();
        let start = course.start_split();
        let mut results: Vec<AthleteSplit> = traces
            .iter()
            .flat_map(|t| matcher.match_athlete(t, &splits, Some(&start)).splits)
            .collect();
        assign_ranks(&mut results);
        results
    }

    fn finish_of<'a>(results: &'a [AthleteSplit], course: &Course, n: u32) -> &'a AthleteSplit {
        let id = course.athlete_id(n);
        results.iter().find(|r| r.athlete_id == id && r.split_id == course.finish).unwrap()
    }

    #[test]
    fn ranks_by_scope() {
        let c = CourseBuilder::ten_k();
        let open = Some(c.open_category);
        let masters = Some(c.masters_category);
        let traces = vec![
            c.trace(1, Gender::Female, open, &[(c.finish_reader, c.after(3100))]),
            c.trace(2, Gender::Male, masters, &[(c.finish_reader, c.after(3000))]),
            c.trace(3, Gender::Female, masters, &[(c.finish_reader, c.after(3050))]),
            c.trace(4, Gender::Male, None, &[(c.finish_reader, c.after(3200))]),
        ];
        let results = compute(&c, &traces);

        let r = |n| finish_of(&results, &c, n).gun_ranks;
        assert_eq!(r(2), Ranks { overall: Some(1), gender: Some(1), category: Some(1) });
        assert_eq!(r(3), Ranks { overall: Some(2), gender: Some(1), category: Some(2) });
        assert_eq!(r(1), Ranks { overall: Some(3), gender: Some(2), category: Some(1) });
        assert_eq!(r(4), Ranks { overall: Some(4), gender: Some(2), category: None });
    }

    #[test]
    fn equal_times_get_sequential_ranks_in_input_order() {
        let c = CourseBuilder::ten_k();
        let traces = vec![
            c.trace(1, Gender::Male, None, &[(c.finish_reader, c.after(3000))]),
            c.trace(2, Gender::Male, None, &[(c.finish_reader, c.after(3000))]),
        ];
        let results = compute(&c, &traces);
        assert_eq!(finish_of(&results, &c, 1).gun_ranks.overall, Some(1));
        assert_eq!(finish_of(&results, &c, 2).gun_ranks.overall, Some(2));
    }

    #[test]
    fn unvisited_results_are_not_ranked() {
        let c = CourseBuilder::ten_k();
        let traces = vec![
            c.trace(1, Gender::Male, None, &[]),
            c.trace(2, Gender::Male, None, &[(c.finish_reader, c.after(3000))]),
        ];
        let results = compute(&c, &traces);
        let unfinished = finish_of(&results, &c, 1);
        assert_eq!(unfinished.gun_ranks, Ranks::default());
        assert_eq!(unfinished.net_ranks, Ranks::default());
        assert_eq!(finish_of(&results, &c, 2).gun_ranks.overall, Some(1));
    }

    #[test]
    fn stale_ranks_are_cleared_when_a_result_disappears() {
        let c = CourseBuilder::ten_k();
        let traces = vec![c.trace(1, Gender::Male, None, &[(c.finish_reader, c.after(3000))])];
        let mut results = compute(&c, &traces);
        let finish = results.iter_mut().find(|r| r.split_id == c.finish).unwrap();
        finish.passage = crate::types::Passage::NotVisited;
        assign_ranks(&mut results);
        assert!(results.iter().all(|r| r.gun_ranks == Ranks::default()));
    }

    #[test]
    fn gun_and_net_orderings_are_independent() {
        let c = CourseBuilder::ten_k();
        let traces = vec![
            // crosses the start late, so slower on gun time but faster on net time
            c.trace(
                1,
                Gender::Female,
                None,
                &[(c.start_reader, c.after(120)), (c.finish_reader, c.after(3050))],
            ),
            c.trace(
                2,
                Gender::Female,
                None,
                &[(c.start_reader, c.after(0)), (c.finish_reader, c.after(3000))],
            ),
        ];
        let results = compute(&c, &traces);
        assert_eq!(finish_of(&results, &c, 1).gun_ranks.overall, Some(2));
        assert_eq!(finish_of(&results, &c, 1).net_ranks.overall, Some(1));
        assert_eq!(finish_of(&results, &c, 2).gun_ranks.overall, Some(1));
        assert_eq!(finish_of(&results, &c, 2).net_ranks.overall, Some(2));
    }

    #[test]
    fn leaderboard_orders_by_rank() {
        let c = CourseBuilder::ten_k();
        let results = compute(&c, &c.synthetic_field(40));
        let board = leaderboard(&results, c.finish, TimeBasis::Net);
        assert!(!board.is_empty());
        for (position, entry) in board.iter().enumerate() {
            assert_eq!(entry.net_ranks.overall, Some(position as u32 + 1));
        }
        assert!(board.windows(2).all(|w| w[0].time(TimeBasis::Net) <= w[1].time(TimeBasis::Net)));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        enum Scope {
            Overall,
            Gender(u8),
            Category(u128),
        }

        proptest! {
            #[test]
            fn prop_ranks_are_dense_and_unique(size in 1u32..120, seed in 0u32..1_000) {
                let c = CourseBuilder::ten_k();
                let mut traces = c.synthetic_field(size);
                // rotate the field so input order differs between cases
                let shift = (seed % size) as usize;
                traces.rotate_left(shift);
                let results = compute(&c, &traces);

                for basis in TimeBasis::ALL {
                    let mut groups: BTreeMap<(Scope, SplitId), Vec<u32>> = BTreeMap::new();
                    for r in results.iter().filter(|r| r.is_visited()) {
                        let ranks = r.ranks(basis);
                        groups.entry((Scope::Overall, r.split_id)).or_default().push(ranks.overall.unwrap());
                        groups.entry((Scope::Gender(r.gender as u8), r.split_id)).or_default().push(ranks.gender.unwrap());
                        if let Some(category) = r.category_id {
                            groups
                                .entry((Scope::Category(category.as_uuid().as_u128()), r.split_id))
                                .or_default()
                                .push(ranks.category.unwrap());
                        }
                    }
                    for ranks in groups.values_mut() {
                        ranks.sort_unstable();
                        let expected: Vec<u32> = (1..=ranks.len() as u32).collect();
                        prop_assert_eq!(&*ranks, &expected);
                    }
                }
            }

            #[test]
            fn prop_ranking_is_idempotent(size in 1u32..60) {
                let c = CourseBuilder::ten_k();
                let mut results = compute(&c, &c.synthetic_field(size));
                let first = results.clone();
                assign_ranks(&mut results);
                prop_assert_eq!(first, results);
            }
        }
    }
}
