use crate::analyzers::types::{
    EntryPointExclusion, ExcludedRoadwayReport, ExclusionSplit, FilterSummary, HourlyExclusion,
    OverallUsage, VehicleExclusion,
};
use crate::analyzers::utility::{pct, round1};
use crate::dataset::{Dataset, Record, View};
use crate::filter::filter_crz_data;
use crate::registry::params::ExcludedRoadwayParams;
use std::collections::BTreeMap;

const TOP_ENTRY_POINTS: usize = 10;

/// Measures how much traffic uses the excluded roadways (FDR Drive, West
/// Side Highway and similar) instead of entering the zone proper.
pub fn analyze_excluded_roadway_usage(
    dataset: &Dataset,
    params: &ExcludedRoadwayParams,
) -> ExcludedRoadwayReport {
    let view = filter_crz_data(dataset, &params.filters);

    let crz_entries = view.crz_total();
    let excluded_entries = view.excluded_total();
    let total_entries = crz_entries + excluded_entries;

    let mut by_entry_point: Vec<EntryPointExclusion> =
        splits_by(&view, |r| r.detection_group.clone())
            .into_iter()
            .map(|(entry_point, split)| EntryPointExclusion { entry_point, split })
            .collect();
    by_entry_point.sort_by(|a, b| {
        b.split
            .excluded_percentage
            .total_cmp(&a.split.excluded_percentage)
    });
    by_entry_point.truncate(TOP_ENTRY_POINTS);

    let by_vehicle_class = splits_by(&view, |r| r.vehicle_class.clone())
        .into_iter()
        .map(|(vehicle_class, split)| VehicleExclusion {
            vehicle_class,
            split,
        })
        .collect();

    let by_time = splits_by(&view, |r| r.hour_of_day)
        .into_iter()
        .map(|(hour, split)| HourlyExclusion { hour, split })
        .collect();

    ExcludedRoadwayReport {
        overall_usage: OverallUsage {
            total_entries,
            crz_entries,
            excluded_entries,
            excluded_percentage: pct(excluded_entries, total_entries),
        },
        by_entry_point,
        by_vehicle_class,
        by_time,
        filter_summary: FilterSummary::new(&params.filters, &view),
    }
}

fn splits_by<K: Ord>(view: &View<'_>, key: impl Fn(&Record) -> K) -> BTreeMap<K, ExclusionSplit> {
    let mut sums: BTreeMap<K, (u64, u64)> = BTreeMap::new();
    for r in view.iter() {
        let entry = sums.entry(key(r)).or_default();
        entry.0 += r.crz_entries;
        entry.1 += r.excluded_roadway_entries;
    }

    sums.into_iter()
        .map(|(k, (crz_entries, excluded_entries))| {
            let total = crz_entries + excluded_entries;
            let split = ExclusionSplit {
                crz_entries,
                excluded_entries,
                total,
                excluded_percentage: round1(pct(excluded_entries, total)),
            };
            (k, split)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixture() -> Dataset {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        Dataset::new(vec![
            Record::new(date, 7, 0, "Peak", "1 - Passenger Vehicle", "FDR Drive at 60th St", "East 60St", 10, 90),
            Record::new(date, 8, 0, "Peak", "1 - Passenger Vehicle", "Brooklyn Bridge", "Brooklyn", 80, 0),
            Record::new(date, 8, 0, "Peak", "5 - Bus", "West Side Highway at 60th St", "West 60St", 30, 30),
            Record::new(date, 9, 0, "Peak", "5 - Bus", "Brooklyn Bridge", "Brooklyn", 0, 0),
        ])
    }

    #[test]
    fn test_overall_and_entry_ranking() {
        let report = analyze_excluded_roadway_usage(&fixture(), &ExcludedRoadwayParams::default());

        assert_eq!(report.overall_usage.total_entries, 240);
        assert_eq!(report.overall_usage.excluded_entries, 120);
        assert_eq!(report.overall_usage.excluded_percentage, 50.0);

        let names: Vec<&str> = report.by_entry_point.iter().map(|e| e.entry_point.as_str()).collect();
        assert_eq!(
            names,
            ["FDR Drive at 60th St", "West Side Highway at 60th St", "Brooklyn Bridge"]
        );
        assert_eq!(report.by_entry_point[0].split.excluded_percentage, 90.0);
    }

    #[test]
    fn test_by_vehicle_and_hour() {
        let report = analyze_excluded_roadway_usage(&fixture(), &ExcludedRoadwayParams::default());

        assert_eq!(report.by_vehicle_class.len(), 2);
        assert_eq!(report.by_vehicle_class[1].vehicle_class, "5 - Bus");
        assert_eq!(report.by_vehicle_class[1].split.excluded_percentage, 50.0);

        let hours: Vec<u8> = report.by_time.iter().map(|h| h.hour).collect();
        assert_eq!(hours, [7, 8, 9]);
        // a bucket with no traffic at all reports 0%, not NaN
        assert_eq!(report.by_time[2].split.total, 0);
        assert_eq!(report.by_time[2].split.excluded_percentage, 0.0);
    }

    #[test]
    fn test_empty_view() {
        let report =
            analyze_excluded_roadway_usage(&Dataset::default(), &ExcludedRoadwayParams::default());
        assert_eq!(report.overall_usage.total_entries, 0);
        assert_eq!(report.overall_usage.excluded_percentage, 0.0);
        assert!(report.by_entry_point.is_empty());
        assert_eq!(report.filter_summary.date_range, "No data");
    }
}
