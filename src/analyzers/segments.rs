use crate::analyzers::types::{Delta, SegmentComparison, SegmentDifferences, SegmentProfile, Share};
use crate::analyzers::utility::{argmax, pct, round1, sort_by_volume_desc, sum_by};
use crate::analyzers::{AnalysisError, Metric};
use crate::dataset::{Dataset, Record, View};
use crate::filter::{FilterSpec, filter_crz_data};
use crate::registry::params::CompareSegmentsParams;
use std::collections::{BTreeMap, BTreeSet};

const TOP_DIFFERENCES: usize = 5;
const TOP_ENTRY_POINTS: usize = 5;

/// Axis along which two segments are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Time,
    Vehicle,
    Location,
}

impl Dimension {
    pub fn parse(value: Option<&str>) -> Result<Self, AnalysisError> {
        match value.map(str::trim) {
            None | Some("") | Some("time") => Ok(Dimension::Time),
            Some("vehicle") => Ok(Dimension::Vehicle),
            Some("location") => Ok(Dimension::Location),
            Some(other) => Err(AnalysisError::unsupported("dimension", other)),
        }
    }

    fn comparison_type(&self) -> &'static str {
        match self {
            Dimension::Time => "Time periods",
            Dimension::Vehicle => "Vehicle classes",
            Dimension::Location => "Locations",
        }
    }
}

/// Compares two independently filtered segments of the table.
///
/// What is compared depends on the dimension: time segments are profiled by
/// vehicle class and entry point, vehicle segments by hour, weekday and entry
/// point, location segments by hour, vehicle class and excluded-roadway
/// share. Every difference is `B - A` in percentage points, ranked by
/// absolute size.
pub fn compare_traffic_segments(
    dataset: &Dataset,
    params: &CompareSegmentsParams,
) -> Result<SegmentComparison, AnalysisError> {
    let present = |s: &Option<FilterSpec>| s.clone().filter(|s| !s.is_empty());
    let (Some(spec_a), Some(spec_b)) = (present(&params.segment_a), present(&params.segment_b))
    else {
        return Err(AnalysisError::Validation(
            "both segment_a and segment_b must be provided".to_string(),
        ));
    };
    let dimension = Dimension::parse(params.dimension.as_deref())?;
    let metric = Metric::parse(params.metric.as_deref())?;

    let a = Segment::new(dataset, &spec_a, metric);
    let b = Segment::new(dataset, &spec_b, metric);

    let total_volume_diff = b.total as i64 - a.total as i64;
    let mut differences = SegmentDifferences {
        total_volume_diff,
        total_volume_pct_diff: if a.total == 0 {
            0.0
        } else {
            total_volume_diff as f64 / a.total as f64 * 100.0
        },
        vehicle_distribution_diff: None,
        entry_point_diff: None,
        hour_distribution_diff: None,
        peak_hour_diff: None,
        excluded_roadway_pct_diff: None,
    };

    let (segment_a, segment_b) = match dimension {
        Dimension::Time => {
            let (vehicles_a, vehicles_b) = (a.vehicle_distribution(), b.vehicle_distribution());
            differences.vehicle_distribution_diff = Some(deltas(&vehicles_a, &vehicles_b));
            differences.entry_point_diff =
                Some(deltas(&a.entry_distribution(), &b.entry_distribution()));

            let profile = |seg: &Segment, label: &str, spec: &FilterSpec, vehicles| SegmentProfile {
                vehicle_distribution: Some(vehicles),
                top_entry_points: Some(seg.top_entry_points()),
                ..seg.profile(period_name(label, spec))
            };
            (
                profile(&a, "A", &spec_a, vehicles_a),
                profile(&b, "B", &spec_b, vehicles_b),
            )
        }
        Dimension::Vehicle => {
            let (hours_a, hours_b) = (a.hour_distribution(), b.hour_distribution());
            differences.hour_distribution_diff = Some(rank(
                (0..24u8)
                    .map(|h| delta(h.to_string(), &hours_a, &hours_b, &h))
                    .collect(),
            ));
            differences.peak_hour_diff = peak_hour_diff(&a, &b);

            let profile = |seg: &Segment, label: &str, spec: &FilterSpec, hours| SegmentProfile {
                peak_hour: seg.peak_hour(),
                hourly_distribution: Some(hours),
                day_distribution: Some(seg.day_distribution()),
                top_entry_points: Some(seg.top_entry_points()),
                ..seg.profile(format!(
                    "Vehicle {label}: {}",
                    spec.vehicle_class().unwrap_or("All vehicles")
                ))
            };
            (
                profile(&a, "A", &spec_a, hours_a),
                profile(&b, "B", &spec_b, hours_b),
            )
        }
        Dimension::Location => {
            let (vehicles_a, vehicles_b) = (a.vehicle_distribution(), b.vehicle_distribution());
            let (excluded_a, excluded_b) = (a.excluded_percentage(), b.excluded_percentage());
            differences.vehicle_distribution_diff = Some(deltas(&vehicles_a, &vehicles_b));
            differences.peak_hour_diff = peak_hour_diff(&a, &b);
            differences.excluded_roadway_pct_diff = Some(round1(excluded_b - excluded_a));

            let profile = |seg: &Segment, label: &str, spec: &FilterSpec, vehicles, excluded| {
                let location = spec
                    .entry_point()
                    .or(spec.entry_region())
                    .unwrap_or("All locations");
                SegmentProfile {
                    peak_hour: seg.peak_hour(),
                    hourly_distribution: Some(seg.hour_distribution()),
                    vehicle_distribution: Some(vehicles),
                    excluded_roadway_percentage: Some(excluded),
                    ..seg.profile(format!("Location {label}: {location}"))
                }
            };
            (
                profile(&a, "A", &spec_a, vehicles_a, excluded_a),
                profile(&b, "B", &spec_b, vehicles_b, excluded_b),
            )
        }
    };

    Ok(SegmentComparison {
        comparison_type: dimension.comparison_type().to_string(),
        segment_a,
        segment_b,
        differences,
    })
}

/// One filtered side of a comparison.
struct Segment<'a> {
    view: View<'a>,
    metric: Metric,
    total: u64,
}

impl<'a> Segment<'a> {
    fn new(dataset: &'a Dataset, spec: &FilterSpec, metric: Metric) -> Self {
        let view = filter_crz_data(dataset, spec);
        let total = view.iter().map(|r| metric.of(r)).sum();
        Self { view, metric, total }
    }

    fn profile(&self, name: String) -> SegmentProfile {
        SegmentProfile {
            name,
            total_volume: self.total,
            peak_hour: None,
            hourly_distribution: None,
            day_distribution: None,
            vehicle_distribution: None,
            top_entry_points: None,
            excluded_roadway_percentage: None,
        }
    }

    fn sums<K: Ord>(&self, key: impl Fn(&Record) -> K) -> BTreeMap<K, u64> {
        let metric = self.metric;
        sum_by(&self.view, key, |r| metric.of(r))
    }

    fn percentages<K: Ord>(&self, key: impl Fn(&Record) -> K) -> BTreeMap<K, f64> {
        self.sums(key)
            .into_iter()
            .map(|(k, v)| (k, round1(pct(v, self.total))))
            .collect()
    }

    fn vehicle_distribution(&self) -> BTreeMap<String, f64> {
        self.percentages(|r| r.vehicle_class.clone())
    }

    fn entry_distribution(&self) -> BTreeMap<String, f64> {
        self.percentages(|r| r.detection_group.clone())
    }

    fn hour_distribution(&self) -> BTreeMap<u8, f64> {
        self.percentages(|r| r.hour_of_day)
    }

    fn day_distribution(&self) -> BTreeMap<String, f64> {
        self.percentages(|r| r.day_of_week.clone())
    }

    fn peak_hour(&self) -> Option<u8> {
        argmax(self.sums(|r| r.hour_of_day))
    }

    fn top_entry_points(&self) -> Vec<Share> {
        let mut ranked: Vec<(String, u64)> =
            self.sums(|r| r.detection_group.clone()).into_iter().collect();
        sort_by_volume_desc(&mut ranked);
        ranked
            .into_iter()
            .take(TOP_ENTRY_POINTS)
            .map(|(name, volume)| Share {
                name,
                volume,
                percentage: round1(pct(volume, self.total)),
            })
            .collect()
    }

    /// Excluded-roadway entries as a share of the segment's metric total
    /// plus those entries.
    fn excluded_percentage(&self) -> f64 {
        let excluded = self.view.excluded_total();
        round1(pct(excluded, self.total + excluded))
    }
}

fn period_name(label: &str, spec: &FilterSpec) -> String {
    let mut name = format!("Period {label}: {}", spec.day_type().unwrap_or("All days"));
    if let Some(hours) = spec.hour_range {
        name.push_str(&format!(", {}-{} hours", hours.start(), hours.end()));
    }
    name
}

fn peak_hour_diff(a: &Segment, b: &Segment) -> Option<i32> {
    Some(i32::from(b.peak_hour()?) - i32::from(a.peak_hour()?))
}

fn delta<K: Ord>(name: String, a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>, key: &K) -> Delta {
    let pa = a.get(key).copied().unwrap_or(0.0);
    let pb = b.get(key).copied().unwrap_or(0.0);
    Delta {
        name,
        delta: round1(pb - pa),
    }
}

/// Differences over the union of both segments' keys.
fn deltas(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> Vec<Delta> {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    rank(keys.into_iter().map(|k| delta(k.clone(), a, b, k)).collect())
}

fn rank(mut items: Vec<Delta>) -> Vec<Delta> {
    items.sort_by(|x, y| y.delta.abs().total_cmp(&x.delta.abs()));
    items.truncate(TOP_DIFFERENCES);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::HourRange;
    use chrono::NaiveDate;

    fn fixture() -> Dataset {
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        Dataset::new(vec![
            Record::new(monday, 8, 0, "Peak", "1 - Passenger Vehicle", "Holland Tunnel", "New Jersey", 60, 0),
            Record::new(monday, 8, 0, "Peak", "5 - Bus", "Brooklyn Bridge", "Brooklyn", 40, 0),
            Record::new(saturday, 14, 0, "Peak", "1 - Passenger Vehicle", "Holland Tunnel", "New Jersey", 150, 0),
            Record::new(saturday, 15, 0, "Peak", "TLC Taxi/FHV", "FDR Drive", "East 60St", 50, 50),
        ])
    }

    fn day(d: &str) -> Option<FilterSpec> {
        Some(FilterSpec {
            day_type: Some(d.into()),
            ..Default::default()
        })
    }

    #[test]
    fn test_time_segments() {
        let params = CompareSegmentsParams {
            dimension: Some("time".into()),
            segment_a: Some(FilterSpec {
                day_type: Some("weekday".into()),
                hour_range: Some(HourRange(7, 9)),
                ..Default::default()
            }),
            segment_b: day("weekend"),
            metric: None,
        };
        let result = compare_traffic_segments(&fixture(), &params).unwrap();

        assert_eq!(result.comparison_type, "Time periods");
        assert_eq!(result.segment_a.name, "Period A: weekday, 7-9 hours");
        assert_eq!(result.segment_b.name, "Period B: weekend");
        assert_eq!(result.differences.total_volume_diff, 100);
        assert_eq!(result.differences.total_volume_pct_diff, 100.0);

        let vehicle_diff = result.differences.vehicle_distribution_diff.unwrap();
        assert_eq!(vehicle_diff[0].name, "5 - Bus");
        assert_eq!(vehicle_diff[0].delta, -40.0);
        assert!(vehicle_diff.windows(2).all(|w| w[0].delta.abs() >= w[1].delta.abs()));
        assert!(result.segment_a.hourly_distribution.is_none());
    }

    #[test]
    fn test_vehicle_segments() {
        let params = CompareSegmentsParams {
            dimension: Some("vehicle".into()),
            segment_a: Some(FilterSpec {
                vehicle_class: Some("1".into()),
                ..Default::default()
            }),
            segment_b: Some(FilterSpec {
                vehicle_class: Some("TLC Taxi/FHV".into()),
                ..Default::default()
            }),
            metric: Some("CRZ Entries".into()),
        };
        let result = compare_traffic_segments(&fixture(), &params).unwrap();

        assert_eq!(result.segment_a.name, "Vehicle A: 1");
        assert_eq!(result.segment_a.peak_hour, Some(14));
        assert_eq!(result.segment_b.peak_hour, Some(15));
        assert_eq!(result.differences.peak_hour_diff, Some(1));
        let hour_diff = result.differences.hour_distribution_diff.unwrap();
        assert_eq!(hour_diff.len(), TOP_DIFFERENCES);
        assert_eq!(hour_diff[0].name, "15");
        assert_eq!(hour_diff[0].delta, 100.0);
    }

    #[test]
    fn test_location_segments() {
        let params = CompareSegmentsParams {
            dimension: Some("location".into()),
            segment_a: Some(FilterSpec {
                entry_point: Some("Holland Tunnel".into()),
                ..Default::default()
            }),
            segment_b: Some(FilterSpec {
                entry_region: Some("East 60St".into()),
                ..Default::default()
            }),
            metric: None,
        };
        let result = compare_traffic_segments(&fixture(), &params).unwrap();

        assert_eq!(result.segment_a.name, "Location A: Holland Tunnel");
        assert_eq!(result.segment_b.name, "Location B: East 60St");
        assert_eq!(result.segment_a.excluded_roadway_percentage, Some(0.0));
        assert_eq!(result.segment_b.excluded_roadway_percentage, Some(50.0));
        assert_eq!(result.differences.excluded_roadway_pct_diff, Some(50.0));
    }

    #[test]
    fn test_missing_segment_is_validation_error() {
        let params = CompareSegmentsParams {
            segment_a: day("weekday"),
            segment_b: Some(FilterSpec::default()),
            ..Default::default()
        };
        assert!(matches!(
            compare_traffic_segments(&fixture(), &params),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_unsupported_dimension() {
        let params = CompareSegmentsParams {
            dimension: Some("weather".into()),
            segment_a: day("weekday"),
            segment_b: day("weekend"),
            metric: None,
        };
        assert_eq!(
            compare_traffic_segments(&fixture(), &params).unwrap_err(),
            AnalysisError::unsupported("dimension", "weather")
        );
    }

    #[test]
    fn test_empty_first_segment() {
        let params = CompareSegmentsParams {
            segment_a: day("Tuesday"),
            segment_b: day("weekend"),
            ..Default::default()
        };
        let result = compare_traffic_segments(&fixture(), &params).unwrap();
        assert_eq!(result.segment_a.total_volume, 0);
        assert_eq!(result.differences.total_volume_pct_diff, 0.0);
        assert_eq!(result.differences.total_volume_diff, 200);
    }
}
