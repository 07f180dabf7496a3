//! Maps comparison keywords ("weekend", "rush_hour", "taxi", ...) to filters.

use crate::filter::{FilterSpec, HourRange};

/// Keywords understood by [`resolve_comparison`].
pub const COMPARISON_KEYWORDS: &[&str] = &[
    "weekday",
    "weekend",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "morning",
    "afternoon",
    "evening",
    "night",
    "rush_hour",
    "peak",
    "overnight",
    "passenger",
    "commercial",
    "truck",
    "large_truck",
    "bus",
    "taxi",
    "opposite_day",
];

/// Resolves a comparison keyword into a partial filter.
///
/// `opposite_day` depends on the day type of the current query. Unknown
/// keywords resolve to an empty spec, which callers treat as "no comparison".
pub fn resolve_comparison(name: &str, current_day_type: Option<&str>) -> FilterSpec {
    let key = name.trim().to_lowercase();

    let day = |d: &str| FilterSpec {
        day_type: Some(d.to_string()),
        ..Default::default()
    };
    let hours = |start, end| FilterSpec {
        hour_range: Some(HourRange(start, end)),
        ..Default::default()
    };
    let period = |p: &str| FilterSpec {
        time_period: Some(p.to_string()),
        ..Default::default()
    };
    let class = |c: &str| FilterSpec {
        vehicle_class: Some(c.to_string()),
        ..Default::default()
    };

    match key.as_str() {
        "weekday" => day("weekday"),
        "weekend" => day("weekend"),
        "monday" => day("Monday"),
        "tuesday" => day("Tuesday"),
        "wednesday" => day("Wednesday"),
        "thursday" => day("Thursday"),
        "friday" => day("Friday"),
        "saturday" => day("Saturday"),
        "sunday" => day("Sunday"),
        "morning" => hours(6, 10),
        "afternoon" => hours(11, 16),
        "evening" => hours(17, 21),
        "night" => hours(22, 5),
        "rush_hour" => hours(7, 9),
        "peak" => period("Peak"),
        "overnight" => period("Overnight"),
        "passenger" => class("1"),
        "commercial" => class("2"),
        "truck" => class("3"),
        "large_truck" => class("4"),
        "bus" => class("5"),
        "taxi" => class("TLC Taxi/FHV"),
        "opposite_day" => opposite_day(current_day_type)
            .map(day)
            .unwrap_or_default(),
        _ => FilterSpec::default(),
    }
}

fn opposite_day(current: Option<&str>) -> Option<&'static str> {
    match current?.trim().to_lowercase().as_str() {
        "weekday" => Some("weekend"),
        "weekend" => Some("weekday"),
        "monday" | "tuesday" | "wednesday" | "thursday" | "friday" => Some("weekend"),
        "saturday" | "sunday" => Some("weekday"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_hour_bands() {
        assert_eq!(
            resolve_comparison("rush_hour", None).hour_range,
            Some(HourRange(7, 9))
        );
        assert_eq!(
            resolve_comparison("Night", None).hour_range,
            Some(HourRange(22, 5))
        );
    }

    #[test]
    fn test_opposite_day() {
        let spec = resolve_comparison("opposite_day", Some("weekday"));
        assert_eq!(spec.day_type.as_deref(), Some("weekend"));

        let spec = resolve_comparison("opposite_day", Some("Tuesday"));
        assert_eq!(spec.day_type.as_deref(), Some("weekend"));

        let spec = resolve_comparison("opposite_day", Some("Sunday"));
        assert_eq!(spec.day_type.as_deref(), Some("weekday"));

        assert!(resolve_comparison("opposite_day", None).is_empty());
    }

    #[test]
    fn test_vehicle_keywords() {
        assert_eq!(resolve_comparison("passenger", None).vehicle_class.as_deref(), Some("1"));
        assert_eq!(
            resolve_comparison("taxi", None).vehicle_class.as_deref(),
            Some("TLC Taxi/FHV")
        );
    }

    #[test]
    fn test_unknown_keyword_is_empty() {
        assert!(resolve_comparison("holiday", Some("weekday")).is_empty());
    }

    #[test]
    fn test_every_keyword_resolves() {
        for keyword in COMPARISON_KEYWORDS {
            let spec = resolve_comparison(keyword, Some("weekday"));
            assert!(!spec.is_empty(), "{keyword} resolved to an empty spec");
        }
    }
}
