//! The in-memory vehicle-entry table.
//!
//! A [`Dataset`] is loaded once per process and never mutated afterwards.
//! Filtering produces a [`View`], a list of shared references into the
//! table, so any number of analyses can read the same dataset concurrently.

pub mod aggregates;
pub mod loader;
pub mod record;

pub use aggregates::{Aggregates, EntryTotals};
pub use loader::{load, parse_date};
pub use record::Record;

use chrono::NaiveDate;

/// Owned, immutable vehicle-entry table.
#[derive(Debug, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A view over every row.
    pub fn view(&self) -> View<'_> {
        View {
            rows: self.records.iter().collect(),
        }
    }

    /// Most recent toll date in the table.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.toll_date).max()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.toll_date).min()
    }
}

/// A read-only selection of rows borrowed from a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct View<'a> {
    rows: Vec<&'a Record>,
}

impl<'a> View<'a> {
    pub fn from_rows(rows: Vec<&'a Record>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[&'a Record] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only the rows matching `predicate`.
    pub fn retain(self, mut predicate: impl FnMut(&Record) -> bool) -> Self {
        let rows = self.rows.into_iter().filter(|r| predicate(*r)).collect();
        Self { rows }
    }

    pub fn crz_total(&self) -> u64 {
        self.iter().map(|r| r.crz_entries).sum()
    }

    pub fn excluded_total(&self) -> u64 {
        self.iter().map(|r| r.excluded_roadway_entries).sum()
    }

    /// Earliest and latest toll dates in the view.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.iter().map(|r| r.toll_date).min()?;
        let max = self.iter().map(|r| r.toll_date).max()?;
        Some((min, max))
    }

    /// `"YYYY-MM-DD to YYYY-MM-DD"`, or `"No data"` for an empty view.
    pub fn date_range_label(&self) -> String {
        match self.date_bounds() {
            Some((min, max)) => format!("{} to {}", min.format("%Y-%m-%d"), max.format("%Y-%m-%d")),
            None => "No data".to_string(),
        }
    }
}
