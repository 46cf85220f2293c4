use hashbrown::HashMap;
use rayon::prelude::*;

use crate::config::StoreConfig;
use crate::store::RecordStore;
use crate::student::Record;

const SEGMENT_SIZE: usize = 1 << 14;

#[derive(Debug, Clone, PartialEq)]
pub struct HallOfFame {
    pub eligible: usize,
    pub entries: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCourse {
    pub label: String,
    pub low: f64,
    pub high: f64,
    pub eligible: usize,
    pub entries: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeptStats {
    pub dept: String,
    pub count: u64,
    pub max: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Copy)]
struct Data {
    max: f64,
    sum: f64,
    count: u64,
}

impl Default for Data {
    fn default() -> Self {
        Self { max: f64::MIN, sum: 0., count: 0 }
    }
}

impl Data {
    fn update(&mut self, value: f64) {
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
    }

    fn merge(&mut self, other: Data) {
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }
}

/// Graduation arithmetic shared by the year-filtered reports.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub current_year: u16,
    pub course_years: u16,
    pub lookback_years: u16,
}

impl Window {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            current_year: config.current_year(),
            course_years: config.course_years,
            lookback_years: config.lookback_years,
        }
    }

    fn graduation_year(&self, year: u16) -> u32 {
        u32::from(year) + u32::from(self.course_years)
    }

    pub fn graduated(&self, year: u16) -> bool {
        self.graduation_year(year) <= u32::from(self.current_year)
    }

    pub fn in_window(&self, year: u16) -> bool {
        let earliest = i64::from(self.current_year) - i64::from(self.lookback_years);
        self.graduated(year) && i64::from(self.graduation_year(year)) >= earliest
    }
}

/// Top record per graduated (year, department); ties keep the lower slot.
pub fn hall_of_fame(store: &RecordStore, window: Window) -> HallOfFame {
    let mut best: HashMap<(u16, usize), &Record, ahash::RandomState> = HashMap::default();
    let mut eligible = 0;
    for record in store.records() {
        if !window.graduated(record.id.year()) {
            continue;
        }
        eligible += 1;
        best.entry((record.id.year(), record.id.dept()))
            .and_modify(|e| {
                if record.cgpa > e.cgpa {
                    *e = record;
                }
            })
            .or_insert(record);
    }
    let mut entries = best.into_iter().collect::<Vec<_>>();
    entries.sort_unstable_by_key(|(key, _)| *key);
    HallOfFame {
        eligible,
        entries: entries.into_iter().map(|(_, record)| record.clone()).collect(),
    }
}

pub fn new_course(store: &RecordStore, window: Window, label: &str, low: f64, high: f64) -> NewCourse {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let mut eligible = 0;
    let mut entries = Vec::new();
    for record in store.records() {
        if !window.in_window(record.id.year()) {
            continue;
        }
        eligible += 1;
        if (low..=high).contains(&record.cgpa) {
            entries.push(record.clone());
        }
    }
    NewCourse { label: label.to_string(), low, high, eligible, entries }
}

pub fn department_stats(store: &RecordStore) -> Vec<DeptStats> {
    let departments = &store.config().departments;
    let storage = || vec![Data::default(); departments.len()];
    // partials are merged in chunk order so the sum does not depend on scheduling
    let partials = store
        .slots()
        .par_chunks(SEGMENT_SIZE)
        .map(|chunk| {
            let mut result = storage();
            for record in chunk.iter().flatten() {
                if let Some(data) = result.get_mut(record.id.dept()) {
                    data.update(record.cgpa);
                }
            }
            result
        })
        .collect::<Vec<_>>();
    let totals = partials.into_iter().fold(storage(), |mut acc, x| {
        for (a, b) in acc.iter_mut().zip(x) {
            a.merge(b);
        }
        acc
    });

    departments
        .iter()
        .zip(totals)
        .map(|(dept, data)| {
            let (max, average) = if data.count == 0 {
                (0., 0.)
            } else {
                (data.max, round1(data.sum / data.count as f64))
            };
            DeptStats { dept: dept.clone(), count: data.count, max, average }
        })
        .collect()
}

/// Rounds the exact binary value to one decimal, ties to even.
#[inline]
fn round1(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
