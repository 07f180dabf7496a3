use crate::analyzers::types::{FilterSummary, FilteredData};
use crate::dataset::Dataset;
use crate::filter::{FilterSpec, filter_crz_data};
use std::collections::BTreeSet;

/// Maximum number of matching rows echoed back by [`filter_records`].
pub const SAMPLE_ROWS: usize = 25;

/// Applies `spec` and describes the matching rows: counts, totals and a
/// bounded sample.
pub fn filter_records(dataset: &Dataset, spec: &FilterSpec) -> FilteredData {
    let view = filter_crz_data(dataset, spec);

    let entry_points: BTreeSet<&str> = view.iter().map(|r| r.detection_group.as_str()).collect();

    FilteredData {
        row_count: view.len(),
        total_crz_entries: view.crz_total(),
        total_excluded_entries: view.excluded_total(),
        entry_point_count: entry_points.len(),
        sample: view.iter().take(SAMPLE_ROWS).cloned().collect(),
        filter_summary: FilterSummary::new(spec, &view),
    }
}
