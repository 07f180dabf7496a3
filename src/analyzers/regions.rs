use crate::analyzers::top_n;
use crate::analyzers::types::{FilterSummary, HourShare, RegionVolume, RegionalFlowReport};
use crate::analyzers::utility::{argmax, pct, round1, sort_by_volume_desc, sum_by};
use crate::dataset::Dataset;
use crate::filter::{FilterSpec, filter_crz_data};
use crate::registry::params::RegionalFlowParams;

const DEFAULT_TOP_N: usize = 5;

/// Ranks detection regions by entry volume.
///
/// The dataset records where vehicles enter the zone, not where they go, so
/// `source_region` narrows the table by region and `destination_region` is
/// only echoed in the summary.
pub fn analyze_regional_traffic_flow(
    dataset: &Dataset,
    params: &RegionalFlowParams,
) -> RegionalFlowReport {
    let spec = match params.source_region.as_deref().filter(|s| !s.is_empty()) {
        Some(region) => FilterSpec {
            entry_region: Some(region.to_string()),
            ..params.filters.clone()
        },
        None => params.filters.clone(),
    };
    let view = filter_crz_data(dataset, &spec);

    let by_region = sum_by(&view, |r| r.detection_region.clone(), |r| r.crz_entries);
    let total_volume: u64 = by_region.values().sum();
    let region_count = by_region.len();

    let mut ranked: Vec<(String, u64)> = by_region.into_iter().collect();
    sort_by_volume_desc(&mut ranked);

    let with_time = params.include_time_variation.unwrap_or(false);
    let top_regions = ranked
        .into_iter()
        .take(top_n(params.top_n, DEFAULT_TOP_N))
        .map(|(region, volume)| {
            let mut entry = RegionVolume {
                region,
                volume,
                percentage: round1(pct(volume, total_volume)),
                peak_hour: None,
                hourly_distribution: None,
            };
            if with_time {
                let region_view = view.clone().retain(|r| r.detection_region == entry.region);
                let hours = sum_by(&region_view, |r| r.hour_of_day, |r| r.crz_entries);
                entry.peak_hour = argmax(hours.iter().map(|(h, v)| (*h, *v)));
                entry.hourly_distribution = Some(
                    hours
                        .into_iter()
                        .map(|(hour, v)| HourShare {
                            hour,
                            volume: v,
                            percentage: round1(pct(v, volume)),
                        })
                        .collect(),
                );
            }
            entry
        })
        .collect();

    let mut filter_summary = FilterSummary::new(&spec, &view);
    filter_summary.destination_region = params.destination_region.clone();

    RegionalFlowReport {
        top_regions,
        total_volume,
        region_count,
        filter_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use chrono::NaiveDate;

    fn fixture() -> Dataset {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        Dataset::new(vec![
            Record::new(date, 8, 0, "Peak", "1 - Passenger Vehicle", "Holland Tunnel", "New Jersey", 30, 0),
            Record::new(date, 9, 0, "Peak", "1 - Passenger Vehicle", "Lincoln Tunnel", "New Jersey", 30, 0),
            Record::new(date, 17, 0, "Peak", "1 - Passenger Vehicle", "Brooklyn Bridge", "Brooklyn", 30, 0),
            Record::new(date, 18, 0, "Peak", "1 - Passenger Vehicle", "Queensboro Bridge", "Queens", 10, 0),
        ])
    }

    #[test]
    fn test_ranked_regions() {
        let report = analyze_regional_traffic_flow(&fixture(), &RegionalFlowParams::default());

        assert_eq!(report.total_volume, 100);
        assert_eq!(report.region_count, 3);
        assert_eq!(report.top_regions[0].region, "New Jersey");
        assert_eq!(report.top_regions[0].percentage, 60.0);
        assert!(report.top_regions[0].hourly_distribution.is_none());
    }

    #[test]
    fn test_time_variation_peak_first_wins() {
        let params = RegionalFlowParams {
            include_time_variation: Some(true),
            top_n: Some(1),
            ..Default::default()
        };
        let report = analyze_regional_traffic_flow(&fixture(), &params);
        let region = &report.top_regions[0];

        assert_eq!(report.top_regions.len(), 1);
        assert_eq!(region.peak_hour, Some(8));
        let hours = region.hourly_distribution.as_ref().unwrap();
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].percentage, 50.0);
    }

    #[test]
    fn test_source_region_narrows_destination_echoes() {
        let params = RegionalFlowParams {
            source_region: Some("Brooklyn".into()),
            destination_region: Some("Midtown".into()),
            ..Default::default()
        };
        let report = analyze_regional_traffic_flow(&fixture(), &params);

        assert_eq!(report.total_volume, 30);
        assert_eq!(report.region_count, 1);
        assert_eq!(report.filter_summary.entry_region, "Brooklyn");
        assert_eq!(report.filter_summary.destination_region.as_deref(), Some("Midtown"));
    }

    #[test]
    fn test_empty_view() {
        let report =
            analyze_regional_traffic_flow(&Dataset::default(), &RegionalFlowParams::default());
        assert_eq!(report.total_volume, 0);
        assert!(report.top_regions.is_empty());
        assert_eq!(report.filter_summary.date_range, "No data");
    }
}
