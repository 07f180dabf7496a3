use crate::dataset::aggregates::Aggregates;
use crate::dataset::record::{RawRecord, Record, UNKNOWN, WEEKDAYS_SUNDAY_FIRST, week_start};
use crate::dataset::Dataset;
use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Loads the vehicle-entry CSV at `path` (plain or `.gz`) and precomputes the
/// convenience aggregates.
#[tracing::instrument(fields(path = %path.as_ref().display()))]
pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Result<(Dataset, Aggregates)> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("failed to open dataset '{}'", path.display()))?;

    let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let dataset = read_records(reader)?;
    let aggregates = Aggregates::from_dataset(&dataset);

    info!(rows = dataset.len(), "Dataset loaded");
    Ok((dataset, aggregates))
}

/// Reads and normalizes every row from a CSV reader.
///
/// Rows without a parseable toll date are skipped.
pub fn read_records<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.deserialize() {
        let raw: RawRecord = result?;
        match normalize(raw) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Rows without a valid toll date were skipped");
    }

    Ok(Dataset::new(records))
}

fn normalize(raw: RawRecord) -> Option<Record> {
    let toll_date = raw.toll_date.as_deref().and_then(parse_date)?;
    let toll_hour_raw = raw.toll_hour.as_deref().and_then(parse_datetime);
    let block_raw = raw.toll_ten_minute_block.as_deref().and_then(parse_datetime);

    let hour_of_day = raw
        .hour_of_day
        .map(count_from)
        .or_else(|| toll_hour_raw.map(|t| u64::from(t.hour())))
        .unwrap_or(0)
        .min(23) as u8;
    let minute_of_hour = raw
        .minute_of_hour
        .map(count_from)
        .or_else(|| block_raw.map(|t| u64::from(t.minute())))
        .unwrap_or(0)
        .min(59) as u8;

    let day_of_week_int = raw
        .day_of_week_int
        .map(count_from)
        .filter(|d| (1..=7).contains(d))
        .map(|d| d as u8)
        .unwrap_or_else(|| toll_date.weekday().number_from_sunday() as u8);
    let day_of_week = categorical(raw.day_of_week)
        .filter(|d| d != UNKNOWN)
        .unwrap_or_else(|| WEEKDAYS_SUNDAY_FIRST[usize::from(day_of_week_int - 1)].to_string());

    let toll_hour = toll_hour_raw.unwrap_or_else(|| {
        toll_date
            .and_hms_opt(u32::from(hour_of_day), 0, 0)
            .unwrap_or_default()
    });
    let toll_ten_minute_block =
        block_raw.unwrap_or_else(|| toll_hour + Duration::minutes(i64::from(minute_of_hour)));
    let toll_week = raw
        .toll_week
        .as_deref()
        .and_then(parse_date)
        .unwrap_or_else(|| week_start(toll_date));

    let mut record = Record {
        toll_date,
        toll_hour,
        toll_ten_minute_block,
        toll_week,
        day_of_week,
        day_of_week_int,
        hour_of_day,
        minute_of_hour,
        time_period: categorical(raw.time_period).unwrap_or_else(|| UNKNOWN.to_string()),
        vehicle_class: categorical(raw.vehicle_class).unwrap_or_else(|| UNKNOWN.to_string()),
        detection_group: categorical(raw.detection_group).unwrap_or_else(|| UNKNOWN.to_string()),
        detection_region: categorical(raw.detection_region)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        crz_entries: raw.crz_entries.map(count_from).unwrap_or(0),
        excluded_roadway_entries: raw.excluded_roadway_entries.map(count_from).unwrap_or(0),
        year: 0,
        month: 0,
        month_name: String::new(),
        week_number: 0,
        is_weekend: false,
        is_peak: false,
    };
    record.derive_columns();
    Some(record)
}

/// Parses a date in either the published `MM/DD/YYYY` form or ISO form.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| parse_datetime(value).map(|dt| dt.date()))
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn categorical(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn count_from(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Toll Date,Toll Hour,Toll 10 Minute Block,Minute of Hour,Hour of Day,Day of Week Int,Day of Week,Toll Week,Time Period,Vehicle Class,Detection Group,Detection Region,CRZ Entries,Excluded Roadway Entries\n";

    #[test]
    fn test_read_records_parses_published_format() {
        let csv = format!(
            "{HEADER}01/06/2025,01/06/2025 08:00:00 AM,01/06/2025 08:20:00 AM,20,8,2,Monday,01/05/2025,Peak,1 - Passenger Vehicle,Brooklyn Bridge,Brooklyn,120,4\n"
        );
        let dataset = read_records(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 1);
        let record = &dataset.records()[0];
        assert_eq!(record.toll_date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(record.hour_of_day, 8);
        assert_eq!(record.minute_of_hour, 20);
        assert_eq!(record.day_of_week, "Monday");
        assert_eq!(record.crz_entries, 120);
        assert_eq!(record.excluded_roadway_entries, 4);
        assert!(record.is_peak);
        assert!(!record.is_weekend);
    }

    #[test]
    fn test_missing_values_are_normalized() {
        let csv = format!("{HEADER}2025-01-11,,,,,,,,,,,,,\n");
        let dataset = read_records(csv.as_bytes()).unwrap();

        let record = &dataset.records()[0];
        assert_eq!(record.crz_entries, 0);
        assert_eq!(record.excluded_roadway_entries, 0);
        assert_eq!(record.vehicle_class, UNKNOWN);
        assert_eq!(record.detection_group, UNKNOWN);
        assert_eq!(record.time_period, UNKNOWN);
        // 2025-01-11 is a Saturday
        assert_eq!(record.day_of_week, "Saturday");
        assert_eq!(record.day_of_week_int, 7);
        assert!(record.is_weekend);
    }

    #[test]
    fn test_rows_without_date_are_skipped() {
        let csv = format!("{HEADER},,,,,,,,,,,,5,0\n01/06/2025,,,,3,,,,,,,,7,0\n");
        let dataset = read_records(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].hour_of_day, 3);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9);
        assert_eq!(parse_date("03/09/2025"), expected);
        assert_eq!(parse_date("2025-03-09"), expected);
        assert_eq!(parse_date("not a date"), None);
    }
}
