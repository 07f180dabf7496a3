//! The common predicate set applied as the first step of every analysis.

use crate::dataset::{Dataset, Record, View, parse_date};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// An ordered `(start, end)` pair of hours.
///
/// `start <= end` is an inclusive range; `start > end` wraps past midnight and
/// selects `hour >= start || hour <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange(pub u8, pub u8);

impl HourRange {
    pub fn start(&self) -> u8 {
        self.0
    }

    pub fn end(&self) -> u8 {
        self.1
    }

    pub fn wraps(&self) -> bool {
        self.0 > self.1
    }

    pub fn contains(&self, hour: u8) -> bool {
        if self.wraps() {
            hour >= self.0 || hour <= self.1
        } else {
            (self.0..=self.1).contains(&hour)
        }
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00 to {}:00", self.0, self.1)
    }
}

/// Optional predicates narrowing the dataset. A missing field places no
/// constraint on the rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour_range: Option<HourRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_period: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub vehicle_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_region: Option<String>,
}

/// Parameter names understood by [`FilterSpec`].
pub const FILTER_FIELDS: &[&str] = &[
    "start_date",
    "end_date",
    "day_type",
    "hour_range",
    "time_period",
    "vehicle_class",
    "entry_point",
    "entry_region",
];

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        *self == FilterSpec::default()
    }

    pub fn day_type(&self) -> Option<&str> {
        present(&self.day_type)
    }

    pub fn vehicle_class(&self) -> Option<&str> {
        present(&self.vehicle_class)
    }

    pub fn entry_point(&self) -> Option<&str> {
        present(&self.entry_point)
    }

    pub fn entry_region(&self) -> Option<&str> {
        present(&self.entry_region)
    }

    pub fn time_period(&self) -> Option<&str> {
        present(&self.time_period)
    }

    /// Narrows `view` by every predicate present in this spec.
    pub fn apply<'a>(&self, view: View<'a>) -> View<'a> {
        let start = match present(&self.start_date).map(parse_date) {
            Some(None) => return View::default(),
            Some(Some(d)) => Some(d),
            None => None,
        };
        let end = match present(&self.end_date).map(parse_date) {
            Some(None) => return View::default(),
            Some(Some(d)) => Some(d),
            None => None,
        };
        let day_type = DayType::from_spec(self.day_type());
        let vehicle_class = self.vehicle_class().map(VehicleClassMatch::from);

        view.retain(|r| {
            start.is_none_or(|s| r.toll_date >= s)
                && end.is_none_or(|e| r.toll_date <= e)
                && day_type.as_ref().is_none_or(|d| d.matches(r))
                && self.hour_range.is_none_or(|h| h.contains(r.hour_of_day))
                && self.time_period().is_none_or(|p| r.time_period == p)
                && vehicle_class.as_ref().is_none_or(|v| v.matches(&r.vehicle_class))
                && self.entry_point().is_none_or(|g| r.detection_group == g)
                && self.entry_region().is_none_or(|g| r.detection_region == g)
        })
    }
}

/// Filters the whole table. Never mutates `dataset`; an empty result is a
/// valid outcome, not an error.
pub fn filter_crz_data<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> View<'a> {
    spec.apply(dataset.view())
}

enum DayType<'s> {
    Weekday,
    Weekend,
    Named(&'s str),
}

impl<'s> DayType<'s> {
    fn from_spec(value: Option<&'s str>) -> Option<Self> {
        let value = value?;
        Some(match value.to_lowercase().as_str() {
            "weekday" => DayType::Weekday,
            "weekend" => DayType::Weekend,
            _ => DayType::Named(value),
        })
    }

    fn matches(&self, r: &Record) -> bool {
        match self {
            DayType::Weekday => (2..=6).contains(&r.day_of_week_int),
            DayType::Weekend => matches!(r.day_of_week_int, 1 | 7),
            DayType::Named(name) => r.day_of_week == *name,
        }
    }
}

enum VehicleClassMatch<'s> {
    Prefix(String),
    Exact(&'s str),
}

impl<'s> From<&'s str> for VehicleClassMatch<'s> {
    fn from(value: &'s str) -> Self {
        match value.parse::<u32>() {
            Ok(n) if value.chars().all(|c| c.is_ascii_digit()) => {
                VehicleClassMatch::Prefix(format!("{n} -"))
            }
            _ => VehicleClassMatch::Exact(value),
        }
    }
}

impl VehicleClassMatch<'_> {
    fn matches(&self, class: &str) -> bool {
        match self {
            VehicleClassMatch::Prefix(prefix) => class.starts_with(prefix.as_str()),
            VehicleClassMatch::Exact(name) => class == *name,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Accepts `"3"`, `3` or `"3 - Small Truck"` for a string-typed field.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => Some(s),
        Some(Loose::Int(n)) => Some(n.to_string()),
        Some(Loose::Float(f)) => Some(format!("{}", f.trunc() as i64)),
        None => None,
    })
}
