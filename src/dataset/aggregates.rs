use crate::dataset::Dataset;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// CRZ and excluded-roadway totals for one bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryTotals {
    pub crz_entries: u64,
    pub excluded_roadway_entries: u64,
}

impl EntryTotals {
    fn add(&mut self, crz: u64, excluded: u64) {
        self.crz_entries += crz;
        self.excluded_roadway_entries += excluded;
    }
}

/// Convenience sums computed once at load time.
///
/// The analysis functions never depend on these; they back the dataset
/// overview printed by the CLI.
#[derive(Debug, Default)]
pub struct Aggregates {
    pub daily: BTreeMap<NaiveDate, EntryTotals>,
    /// Keyed by (day name, hour of day).
    pub hourly_by_weekday: BTreeMap<(String, u8), EntryTotals>,
    pub vehicle_class: BTreeMap<String, EntryTotals>,
    pub entry_point: BTreeMap<String, EntryTotals>,
}

impl Aggregates {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut aggregates = Aggregates::default();

        for r in dataset.records() {
            let (crz, excluded) = (r.crz_entries, r.excluded_roadway_entries);

            aggregates
                .daily
                .entry(r.toll_date)
                .or_default()
                .add(crz, excluded);
            aggregates
                .hourly_by_weekday
                .entry((r.day_of_week.clone(), r.hour_of_day))
                .or_default()
                .add(crz, excluded);
            aggregates
                .vehicle_class
                .entry(r.vehicle_class.clone())
                .or_default()
                .add(crz, excluded);
            aggregates
                .entry_point
                .entry(r.detection_group.clone())
                .or_default()
                .add(crz, excluded);
        }

        aggregates
    }

    /// Sum over every day.
    pub fn totals(&self) -> EntryTotals {
        let mut totals = EntryTotals::default();
        for day in self.daily.values() {
            totals.add(day.crz_entries, day.excluded_roadway_entries);
        }
        totals
    }

    /// First and last dates present, if any.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.daily.keys().next()?;
        let last = self.daily.keys().next_back()?;
        Some((*first, *last))
    }
}
