use serde::Serializer;
use serde_json::{Number, Value};

// Integers above this lose precision as f64, so they are left as floats.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Writes `value` the way `JSON.stringify` would: `5.0` becomes `5`.
pub fn serialize_js<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match as_integer(*value) {
        Some(integer) => serializer.serialize_i64(integer),
        None => serializer.serialize_f64(*value),
    }
}

/// Same normalisation applied to every number inside a JSON value.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Number(number) => Value::Number(normalize_number(number)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Formats a number for the `extra` text, integral floats without a fraction.
pub fn format_js(value: f64) -> String {
    match as_integer(value) {
        Some(integer) => integer.to_string(),
        None => value.to_string(),
    }
}

fn normalize_number(number: Number) -> Number {
    if number.is_f64() {
        if let Some(integer) = number.as_f64().and_then(as_integer) {
            return Number::from(integer);
        }
    }
    number
}

fn as_integer(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_floats_lose_their_fraction() {
        assert_eq!(format_js(5.0), "5");
        assert_eq!(format_js(-0.0), "0");
        assert_eq!(format_js(0.05), "0.05");
        assert_eq!(format_js(15497440.5), "15497440.5");
    }

    #[test]
    fn normalize_walks_nested_values() {
        let value = json!({"seconds": 5.0, "nested": [0.0, 0.01, {"x": 2.0}], "flag": true});
        let normalized = normalize(value);

        assert_eq!(
            serde_json::to_string(&normalized).unwrap(),
            r#"{"seconds":5,"nested":[0,0.01,{"x":2}],"flag":true}"#
        );
    }

    #[test]
    fn huge_values_stay_floats() {
        assert_eq!(as_integer(1e300), None);
        assert_eq!(as_integer(f64::NAN), None);
        assert_eq!(as_integer(f64::INFINITY), None);
    }
}
