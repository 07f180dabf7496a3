//! Turns a model-extracted parameter object into a typed call.

use crate::registry::{self, FunctionCall, FunctionName, RegistryError};
use serde_json::{Map, Value};
use tracing::warn;

/// Keys whose values are filter mappings that may carry their own
/// `hour_range`.
const NESTED_FILTERS: &[&str] = &["segment_a", "segment_b", "compare_with"];

/// Drops nulls and parameters `function` does not accept, and normalizes
/// hour ranges to `[start, end]` pairs at every filter level.
pub fn prepare(function: FunctionName, parameters: Map<String, Value>) -> Map<String, Value> {
    let descriptor = registry::catalog::descriptor(function);

    let mut prepared: Map<String, Value> = parameters
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .filter(|(key, _)| {
            let accepted = descriptor.accepts(key);
            if !accepted {
                warn!(%function, parameter = %key, "Dropping parameter the function does not accept");
            }
            accepted
        })
        .collect();

    normalize_hour_range(&mut prepared);
    for key in NESTED_FILTERS {
        if let Some(Value::Object(nested)) = prepared.get_mut(*key) {
            normalize_hour_range(nested);
        }
    }
    prepared
}

/// [`prepare`]s `parameters` and binds them to `function`'s parameter type.
pub fn bind(
    function: FunctionName,
    parameters: Map<String, Value>,
) -> Result<FunctionCall, RegistryError> {
    FunctionCall::from_parameters(function, prepare(function, parameters))
}

fn normalize_hour_range(filters: &mut Map<String, Value>) {
    let Some(raw) = filters.get("hour_range") else {
        return;
    };
    match hour_pair(raw) {
        Some((start, end)) => {
            filters.insert("hour_range".to_string(), Value::from(vec![start, end]));
        }
        None => {
            warn!(hour_range = %raw, "Dropping unusable hour_range");
            filters.remove("hour_range");
        }
    }
}

/// Reads `[6, 10]`, `["6", "10"]`, `"6-10"` or a single hour `8`.
fn hour_pair(value: &Value) -> Option<(u8, u8)> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [start, end] => Some((hour(start)?, hour(end)?)),
            _ => None,
        },
        Value::String(s) => {
            let (start, end) = s.split_once(['-', ',']).unwrap_or((s, s));
            Some((parse_hour(start)?, parse_hour(end)?))
        }
        Value::Number(_) => hour(value).map(|h| (h, h)),
        _ => None,
    }
}

fn hour(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .filter(|h| *h <= 23)
            .map(|h| h as u8),
        Value::String(s) => parse_hour(s),
        _ => None,
    }
}

fn parse_hour(s: &str) -> Option<u8> {
    let s = s.trim();
    let s = s.split_once(':').map_or(s, |(h, _)| h);
    s.trim().parse::<u8>().ok().filter(|h| *h <= 23)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::HourRange;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_drops_unaccepted_keys_and_nulls() {
        let prepared = prepare(
            FunctionName::AnalyzeExcludedRoadwayUsage,
            object(json!({
                "entry_region": "Brooklyn",
                "entry_point": "Brooklyn Bridge",
                "top_n": 3,
                "day_type": null
            })),
        );
        assert_eq!(Value::Object(prepared), json!({"entry_region": "Brooklyn"}));
    }

    #[test]
    fn test_hour_range_forms() {
        assert_eq!(hour_pair(&json!([6, 10])), Some((6, 10)));
        assert_eq!(hour_pair(&json!(["22", "5"])), Some((22, 5)));
        assert_eq!(hour_pair(&json!("7-9")), Some((7, 9)));
        assert_eq!(hour_pair(&json!("17:00, 21:00")), Some((17, 21)));
        assert_eq!(hour_pair(&json!(8)), Some((8, 8)));
        assert_eq!(hour_pair(&json!(8.0)), Some((8, 8)));
        assert_eq!(hour_pair(&json!([6, 10, 12])), None);
        assert_eq!(hour_pair(&json!([6, 24])), None);
        assert_eq!(hour_pair(&json!({"start": 6})), None);
    }

    #[test]
    fn test_unusable_hour_range_is_dropped() {
        let prepared = prepare(
            FunctionName::FilterCrzData,
            object(json!({"hour_range": [1, 2, 3], "day_type": "weekend"})),
        );
        assert_eq!(Value::Object(prepared), json!({"day_type": "weekend"}));
    }

    #[test]
    fn test_nested_segments_are_normalized() {
        let call = bind(
            FunctionName::CompareTrafficSegments,
            object(json!({
                "dimension": "time",
                "segment_a": {"hour_range": "7-9"},
                "segment_b": {"hour_range": ["17", "19"], "day_type": "weekday"},
                "top_n": 4
            })),
        )
        .unwrap();

        match call {
            FunctionCall::CompareTrafficSegments(p) => {
                assert_eq!(p.segment_a.unwrap().hour_range, Some(HourRange(7, 9)));
                let b = p.segment_b.unwrap();
                assert_eq!(b.hour_range, Some(HourRange(17, 19)));
                assert_eq!(b.day_type.as_deref(), Some("weekday"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_compare_with_mapping_is_normalized() {
        let prepared = prepare(
            FunctionName::AnalyzeVehicleDistribution,
            object(json!({"compare_with": {"hour_range": [22, "5"]}})),
        );
        assert_eq!(prepared["compare_with"]["hour_range"], json!([22, 5]));
    }
}
