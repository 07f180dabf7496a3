use crate::analyzers::top_n;
use crate::analyzers::types::{EntryPointVolume, EntryPointVolumeReport, FilterSummary};
use crate::analyzers::utility::{pct, round1, sort_by_volume_desc, sum_by};
use crate::dataset::{Dataset, Record};
use crate::filter::filter_crz_data;
use crate::registry::params::EntryPointVolumeParams;
use std::collections::HashMap;

const DEFAULT_TOP_N: usize = 10;

/// Ranks entry points by volume.
///
/// Volume is `crz_entries`, or CRZ plus excluded-roadway entries when
/// `include_excluded_roadways` is set. Percentages are relative to the grand
/// total across every entry point, not just the returned top N.
pub fn analyze_entry_point_volume(
    dataset: &Dataset,
    params: &EntryPointVolumeParams,
) -> EntryPointVolumeReport {
    let view = filter_crz_data(dataset, &params.filters);
    let include_excluded = params.include_excluded_roadways.unwrap_or(false);

    let volume = |r: &Record| {
        if include_excluded {
            r.total_entries()
        } else {
            r.crz_entries
        }
    };
    let by_entry = sum_by(&view, |r| r.detection_group.clone(), volume);
    let total_volume: u64 = by_entry.values().sum();
    let entry_count = by_entry.len();

    // first matching row wins
    let mut regions: HashMap<&str, &str> = HashMap::new();
    for r in view.iter() {
        regions
            .entry(r.detection_group.as_str())
            .or_insert(r.detection_region.as_str());
    }

    let mut ranked: Vec<(String, u64)> = by_entry.into_iter().collect();
    sort_by_volume_desc(&mut ranked);

    let top_entry_points = ranked
        .into_iter()
        .take(top_n(params.top_n, DEFAULT_TOP_N))
        .map(|(entry_point, volume)| EntryPointVolume {
            region: regions
                .get(entry_point.as_str())
                .copied()
                .unwrap_or(crate::dataset::record::UNKNOWN)
                .to_string(),
            entry_point,
            volume,
            percentage: round1(pct(volume, total_volume)),
        })
        .collect();

    let mut filter_summary = FilterSummary::new(&params.filters, &view);
    filter_summary.entry_count = Some(entry_count);

    EntryPointVolumeReport {
        top_entry_points,
        total_volume,
        filter_summary,
    }
}
