//! Benchmarks for split matching
//!
//! Measures the per-athlete matcher on:
//! - a point-to-point course with duplicate and out-of-window reads
//! - a looped course where one mat serves every lap
//! - a whole synthetic field, the unit of work of one event recompute

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use finishline::SplitMatcher;
use finishline::test_utils::{CourseBuilder, LapCourse};
use std::hint::black_box;

fn bench_single_athlete(c: &mut Criterion) {
    let course = CourseBuilder::ten_k();
    let splits = course.splits();
    let start = course.start_split();
    let trace = course.synthetic_field(2).pop().expect("field has athletes");
    let matcher = SplitMatcher::default();

    c.bench_function("match_athlete/point_to_point", |b| {
        b.iter(|| matcher.match_athlete(black_box(&trace), &splits, Some(&start)))
    });
}

fn bench_laps(c: &mut Criterion) {
    let matcher = SplitMatcher::default();
    let mut group = c.benchmark_group("match_athlete/laps");

    for laps in [5u32, 20, 50] {
        let course = LapCourse::new(laps, 120);
        let splits = course.splits();
        let start = course.start_split();
        // Two reads per passage plus some noise between laps
        let reads: Vec<i64> = (0..laps as i64)
            .flat_map(|lap| [lap * 300 + 5, lap * 300 + 6, lap * 300 + 150])
            .collect();
        let trace = course.trace(&reads);

        group.bench_with_input(BenchmarkId::from_parameter(laps), &trace, |b, trace| {
            b.iter(|| matcher.match_athlete(black_box(trace), &splits, Some(&start)))
        });
    }
    group.finish();
}

fn bench_field(c: &mut Criterion) {
    let course = CourseBuilder::ten_k();
    let splits = course.splits();
    let start = course.start_split();
    let matcher = SplitMatcher::default();
    let mut group = c.benchmark_group("match_field");

    for size in [100u32, 1_000, 10_000] {
        let field = course.synthetic_field(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &field, |b, field| {
            b.iter(|| {
                field
                    .iter()
                    .map(|trace| matcher.match_athlete(trace, &splits, Some(&start)).splits.len())
                    .sum::<usize>()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_athlete, bench_laps, bench_field);
criterion_main!(benches);
