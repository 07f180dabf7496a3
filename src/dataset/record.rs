//! Row types for the Congestion Relief Zone vehicle-entry table.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Sentinel used for missing categorical values.
pub const UNKNOWN: &str = "Unknown";

/// Canonical weekday names in Monday-first order.
pub const WEEKDAYS_MONDAY_FIRST: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Canonical weekday names in the dataset's Sunday-first order
/// (index + 1 == `day_of_week_int`).
pub const WEEKDAYS_SUNDAY_FIRST: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A single row exactly as it appears in the published CSV.
///
/// Every column is optional so that blank cells can be normalized instead of
/// failing the whole load.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(rename = "Toll Date")]
    pub(crate) toll_date: Option<String>,
    #[serde(rename = "Toll Hour")]
    pub(crate) toll_hour: Option<String>,
    #[serde(rename = "Toll 10 Minute Block")]
    pub(crate) toll_ten_minute_block: Option<String>,
    #[serde(rename = "Minute of Hour")]
    pub(crate) minute_of_hour: Option<f64>,
    #[serde(rename = "Hour of Day")]
    pub(crate) hour_of_day: Option<f64>,
    #[serde(rename = "Day of Week Int")]
    pub(crate) day_of_week_int: Option<f64>,
    #[serde(rename = "Day of Week")]
    pub(crate) day_of_week: Option<String>,
    #[serde(rename = "Toll Week")]
    pub(crate) toll_week: Option<String>,
    #[serde(rename = "Time Period")]
    pub(crate) time_period: Option<String>,
    #[serde(rename = "Vehicle Class")]
    pub(crate) vehicle_class: Option<String>,
    #[serde(rename = "Detection Group")]
    pub(crate) detection_group: Option<String>,
    #[serde(rename = "Detection Region")]
    pub(crate) detection_region: Option<String>,
    #[serde(rename = "CRZ Entries")]
    pub(crate) crz_entries: Option<f64>,
    #[serde(rename = "Excluded Roadway Entries")]
    pub(crate) excluded_roadway_entries: Option<f64>,
}

/// One vehicle-entry row after cleaning and feature engineering.
///
/// Records are immutable once loaded; analysis code only ever holds shared
/// references to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub toll_date: NaiveDate,
    pub toll_hour: NaiveDateTime,
    pub toll_ten_minute_block: NaiveDateTime,
    pub toll_week: NaiveDate,
    pub day_of_week: String,
    pub day_of_week_int: u8,
    pub hour_of_day: u8,
    pub minute_of_hour: u8,
    pub time_period: String,
    pub vehicle_class: String,
    pub detection_group: String,
    pub detection_region: String,
    pub crz_entries: u64,
    pub excluded_roadway_entries: u64,

    // derived at load
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub week_number: u32,
    pub is_weekend: bool,
    pub is_peak: bool,
}

impl Record {
    /// Builds a record from its source columns and computes the derived ones.
    ///
    /// `day_of_week_int` follows the dataset convention (1 = Sunday ... 7 = Saturday).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        toll_date: NaiveDate,
        hour_of_day: u8,
        minute_of_hour: u8,
        time_period: &str,
        vehicle_class: &str,
        detection_group: &str,
        detection_region: &str,
        crz_entries: u64,
        excluded_roadway_entries: u64,
    ) -> Self {
        let day_of_week_int = toll_date.weekday().number_from_sunday() as u8;
        let toll_hour = toll_date
            .and_hms_opt(u32::from(hour_of_day.min(23)), 0, 0)
            .unwrap_or_default();
        let toll_ten_minute_block = toll_hour + Duration::minutes(i64::from(minute_of_hour));
        let toll_week = week_start(toll_date);

        let mut record = Record {
            toll_date,
            toll_hour,
            toll_ten_minute_block,
            toll_week,
            day_of_week: WEEKDAYS_SUNDAY_FIRST[usize::from(day_of_week_int - 1)].to_string(),
            day_of_week_int,
            hour_of_day,
            minute_of_hour,
            time_period: time_period.to_string(),
            vehicle_class: vehicle_class.to_string(),
            detection_group: detection_group.to_string(),
            detection_region: detection_region.to_string(),
            crz_entries,
            excluded_roadway_entries,
            year: 0,
            month: 0,
            month_name: String::new(),
            week_number: 0,
            is_weekend: false,
            is_peak: false,
        };
        record.derive_columns();
        record
    }

    /// Recomputes every derived column from the source columns.
    pub(crate) fn derive_columns(&mut self) {
        self.year = self.toll_date.year();
        self.month = self.toll_date.month();
        self.month_name = self.toll_date.format("%B").to_string();
        self.week_number = self.toll_date.iso_week().week();
        self.is_weekend = matches!(self.day_of_week_int, 1 | 7);
        self.is_peak = self.time_period == "Peak";
    }

    /// CRZ plus excluded-roadway entries.
    pub fn total_entries(&self) -> u64 {
        self.crz_entries + self.excluded_roadway_entries
    }
}

/// Start (Sunday) of the toll week containing `date`.
pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday();
    date - Duration::days(i64::from(offset))
}

/// Position of a weekday name in Monday-first order, if it is one.
pub fn monday_index(day: &str) -> Option<usize> {
    WEEKDAYS_MONDAY_FIRST.iter().position(|d| *d == day)
}

/// Position of a weekday name in Sunday-first order, if it is one.
pub fn sunday_index(day: &str) -> Option<usize> {
    WEEKDAYS_SUNDAY_FIRST.iter().position(|d| *d == day)
}
