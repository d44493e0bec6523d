//! Test utilities: course fixtures and synthetic fields
//!
//! These builders produce small, fully valid race configurations with
//! deterministic ids so unit tests, integration tests and benchmarks all talk
//! about the same course.

#![cfg(any(test, feature = "benchmark"))]

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use std::time::Duration;

use crate::config::RaceConfig;
use crate::types::{
    Athlete, AthleteId, AthleteStatus, AthleteTrace, Category, CategoryId, Detection, Event,
    EventId, Gender, Race, RaceId, ReaderRecord, Split, SplitId, SplitKind, TimeReader,
    TimeReaderId, Wave, WaveId,
};

/// Race day used by every fixture.
pub fn race_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 3).expect("valid fixture date")
}

/// Time of day on race day, UTC.
pub fn hms(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 3, hour, minute, second).single().expect("valid fixture time")
}

#[allow(clippy::too_many_arguments)]
fn split(
    id: SplitId,
    event_id: EventId,
    name: &str,
    kind: SplitKind,
    distance: f64,
    reader: TimeReaderId,
    min_secs: u64,
    max_secs: u64,
) -> Split {
    Split {
        id,
        event_id,
        name: name.to_string(),
        kind,
        distance_from_start: distance,
        time_reader_id: reader,
        min_time: Duration::from_secs(min_secs),
        max_time: Duration::from_secs(max_secs),
        min_lap_time: Duration::ZERO,
        previous_lap_split_id: None,
    }
}

/// A point-to-point 10K: start mat, 5 km mat, finish mat; one launched wave at 08:00.
#[derive(Debug, Clone)]
pub struct Course {
    pub config: RaceConfig,
    pub race_id: RaceId,
    pub event_id: EventId,
    pub wave_id: WaveId,
    pub wave_start: DateTime<Utc>,
    pub start: SplitId,
    pub km5: SplitId,
    pub finish: SplitId,
    pub start_reader: TimeReaderId,
    pub km5_reader: TimeReaderId,
    pub finish_reader: TimeReaderId,
    pub open_category: CategoryId,
    pub masters_category: CategoryId,
    seed: u128,
}

/// Builder for [`Course`]; the seed keeps ids of several courses apart.
#[derive(Debug, Clone)]
pub struct CourseBuilder {
    seed: u128,
    wave_start: DateTime<Utc>,
    launched: bool,
}

impl CourseBuilder {
    pub fn ten_k() -> Course {
        Self::with_seed(0).build()
    }

    pub fn with_seed(seed: u128) -> Self {
        Self { seed, wave_start: hms(8, 0, 0), launched: true }
    }

    pub fn wave_start(mut self, wave_start: DateTime<Utc>) -> Self {
        self.wave_start = wave_start;
        self
    }

    pub fn launched(mut self, launched: bool) -> Self {
        self.launched = launched;
        self
    }

    pub fn build(self) -> Course {
        let base = self.seed << 64;
        let race_id = RaceId::from_u128(base + 0x1);
        let event_id = EventId::from_u128(base + 0x10);
        let wave_id = WaveId::from_u128(base + 0x1_0000);
        let open_category = CategoryId::from_u128(base + 0x20);
        let masters_category = CategoryId::from_u128(base + 0x21);
        let start_reader = TimeReaderId::from_u128(base + 0x100);
        let km5_reader = TimeReaderId::from_u128(base + 0x101);
        let finish_reader = TimeReaderId::from_u128(base + 0x102);
        let start = SplitId::from_u128(base + 0x1001);
        let km5 = SplitId::from_u128(base + 0x1002);
        let finish = SplitId::from_u128(base + 0x1003);

        let mut config = RaceConfig::new(Race {
            id: race_id,
            name: format!("City 10K #{}", self.seed),
            timezone: "Europe/Madrid".to_string(),
        });
        config.events.push(Event {
            id: event_id,
            race_id,
            name: "10K".to_string(),
            distance: 10_000.0,
            date: race_day(),
        });
        config.categories.push(Category { id: open_category, event_id, name: "Open".into() });
        config.categories.push(Category { id: masters_category, event_id, name: "M40".into() });
        for (id, name) in
            [(start_reader, "Start mat"), (km5_reader, "5K mat"), (finish_reader, "Finish mat")]
        {
            config.time_readers.push(TimeReader { id, race_id, name: name.to_string() });
        }
        config.splits.push(split(start, event_id, "Start", SplitKind::Start, 0.0, start_reader, 0, 1800));
        config.splits.push(split(km5, event_id, "5K", SplitKind::Standard, 5_000.0, km5_reader, 180, 0));
        config.splits.push(split(
            finish,
            event_id,
            "Finish",
            SplitKind::Finish,
            10_000.0,
            finish_reader,
            300,
            0,
        ));
        config.waves.push(Wave {
            id: wave_id,
            event_id,
            name: "Wave A".to_string(),
            start_time: self.wave_start,
            is_launched: self.launched,
        });

        Course {
            config,
            race_id,
            event_id,
            wave_id,
            wave_start: self.wave_start,
            start,
            km5,
            finish,
            start_reader,
            km5_reader,
            finish_reader,
            open_category,
            masters_category,
            seed: self.seed,
        }
    }
}

impl Course {
    /// Splits ordered along the course.
    pub fn splits(&self) -> Vec<Split> {
        self.config.splits_for_event(self.event_id)
    }

    pub fn start_split(&self) -> Split {
        self.splits().into_iter().find(|s| s.is_start()).expect("course has a start split")
    }

    /// Wave start plus `secs`.
    pub fn after(&self, secs: i64) -> DateTime<Utc> {
        self.wave_start + TimeDelta::seconds(secs)
    }

    pub fn athlete_id(&self, n: u32) -> AthleteId {
        AthleteId::from_u128((self.seed << 64) + 0x100_0000 + n as u128)
    }

    /// Registered athlete number `n` in the course's only wave.
    pub fn athlete(&self, n: u32, gender: Gender, category_id: Option<CategoryId>) -> Athlete {
        Athlete {
            id: self.athlete_id(n),
            race_id: self.race_id,
            event_id: self.event_id,
            wave_id: self.wave_id,
            bib: n.to_string(),
            chip: format!("CHIP{:05}", n),
            gender,
            category_id,
            status: AthleteStatus::NotYetStarted,
        }
    }

    /// A usable raw record for `athlete` at `reader`.
    pub fn read(&self, athlete: &Athlete, reader: TimeReaderId, tod: DateTime<Utc>) -> ReaderRecord {
        ReaderRecord { chip: athlete.chip.clone(), tod, time_reader_id: reader, can_use: true }
    }

    /// Scoring trace for athlete `n` with the given `(reader, tod)` detections.
    pub fn trace(
        &self,
        n: u32,
        gender: Gender,
        category_id: Option<CategoryId>,
        detections: &[(TimeReaderId, DateTime<Utc>)],
    ) -> AthleteTrace {
        let athlete = self.athlete(n, gender, category_id);
        let records: Vec<ReaderRecord> =
            detections.iter().map(|(reader, tod)| self.read(&athlete, *reader, *tod)).collect();
        AthleteTrace::from_records(&athlete, self.wave_start, &records)
    }

    /// Deterministic field of `size` athletes, including duplicate and noisy reads.
    pub fn synthetic_field(&self, size: u32) -> Vec<AthleteTrace> {
        (0..size)
            .map(|n| {
                let gender = if n % 2 == 0 { Gender::Female } else { Gender::Male };
                let category = match (n % 5, n % 3) {
                    (0, _) => None,
                    (_, 0) => Some(self.masters_category),
                    _ => Some(self.open_category),
                };
                let start = (n % 90) as i64;
                let km5 = 1_200 + ((n as i64 * 37) % 900);
                let finish = km5 * 2 + ((n as i64 * 13) % 300);
                let mut detections = vec![
                    (self.start_reader, self.after(start)),
                    (self.start_reader, self.after(start + 2)),
                    (self.km5_reader, self.after(60)),
                    (self.km5_reader, self.after(km5)),
                    (self.km5_reader, self.after(km5 + 1)),
                ];
                // Every seventh athlete has not reached the finish yet
                if n % 7 != 0 {
                    detections.push((self.finish_reader, self.after(finish)));
                    detections.push((self.finish_reader, self.after(finish + 4)));
                }
                self.trace(n, gender, category, &detections)
            })
            .collect()
    }
}

/// A looped course: one mat serves the start, every lap and the finish.
#[derive(Debug, Clone)]
pub struct LapCourse {
    pub config: RaceConfig,
    pub event_id: EventId,
    pub reader: TimeReaderId,
    pub wave_start: DateTime<Utc>,
    pub start: SplitId,
    /// Intermediate lap splits, in order
    pub laps: Vec<SplitId>,
    pub finish: SplitId,
}

impl LapCourse {
    /// `laps` total laps with a minimum lap time of `min_lap_secs`.
    pub fn new(laps: u32, min_lap_secs: u64) -> Self {
        let base = 7u128 << 64;
        let race_id = RaceId::from_u128(base + 0x1);
        let event_id = EventId::from_u128(base + 0x10);
        let reader = TimeReaderId::from_u128(base + 0x100);
        let start = SplitId::from_u128(base + 0x1000);
        let finish = SplitId::from_u128(base + 0x1fff);
        let wave_start = hms(9, 0, 0);

        let mut config = RaceConfig::new(Race {
            id: race_id,
            name: "Criterium".to_string(),
            timezone: "UTC".to_string(),
        });
        config.events.push(Event {
            id: event_id,
            race_id,
            name: "Elite".to_string(),
            distance: 1_000.0 * laps as f64,
            date: race_day(),
        });
        config.time_readers.push(TimeReader { id: reader, race_id, name: "Line".to_string() });
        config.waves.push(Wave {
            id: WaveId::from_u128(base + 0x1_0000),
            event_id,
            name: "Elite".to_string(),
            start_time: wave_start,
            is_launched: true,
        });
        config.splits.push(split(start, event_id, "Start", SplitKind::Start, 0.0, reader, 0, 60));

        let mut previous = start;
        let mut lap_ids = Vec::new();
        for lap in 1..laps {
            let id = SplitId::from_u128(base + 0x1000 + lap as u128);
            let mut s = split(
                id,
                event_id,
                &format!("Lap {}", lap),
                SplitKind::Standard,
                1_000.0 * lap as f64,
                reader,
                0,
                0,
            );
            s.min_lap_time = Duration::from_secs(min_lap_secs);
            s.previous_lap_split_id = Some(previous);
            config.splits.push(s);
            lap_ids.push(id);
            previous = id;
        }

        let mut last = split(
            finish,
            event_id,
            "Finish",
            SplitKind::Finish,
            1_000.0 * laps as f64,
            reader,
            0,
            0,
        );
        last.min_lap_time = Duration::from_secs(min_lap_secs);
        last.previous_lap_split_id = Some(previous);
        config.splits.push(last);

        Self { config, event_id, reader, wave_start, start, laps: lap_ids, finish }
    }

    pub fn splits(&self) -> Vec<Split> {
        self.config.splits_for_event(self.event_id)
    }

    pub fn start_split(&self) -> Split {
        self.splits().into_iter().find(|s| s.is_start()).expect("course has a start split")
    }

    /// Trace whose detections all come from the line mat, `secs` after the gun.
    pub fn trace(&self, secs: &[i64]) -> AthleteTrace {
        AthleteTrace {
            athlete_id: AthleteId::from_u128((7u128 << 64) + 0x100_0001),
            bib: "1".to_string(),
            chip: "LAP00001".to_string(),
            gender: Gender::Male,
            category_id: None,
            wave_start: self.wave_start,
            status: AthleteStatus::NotYetStarted,
            detections: secs
                .iter()
                .map(|s| Detection {
                    time_reader_id: self.reader,
                    tod: self.wave_start + TimeDelta::seconds(*s),
                })
                .collect(),
        }
    }
}
