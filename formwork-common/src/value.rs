//! Loose views over field values.
//!
//! Form values arrive from widgets in whatever shape the widget produced, so
//! comparisons are done on a string rendering that mirrors how a browser
//! would stringify the same value (`42.0` renders as `"42"`, `true` as
//! `"true"`, arrays join with `,`).

use serde_json::Value;

/// Separator used when list values travel as delimited text.
pub const DEFAULT_ARRAY_DELIMITER: &str = ",";

/// Render a number the way a browser does: plain digits between `1e-6` and
/// `1e21`, exponent notation with an explicit sign outside that range.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let rendered = format!("{n:e}");
        return match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => rendered,
        };
    }
    if n.fract() == 0.0 {
        return format!("{n:.0}");
    }
    format!("{n}")
}

/// String rendering of a value. `null` has no rendering.
pub fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => format_number(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| loose_string(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some("[object Object]".to_string()),
    }
}

/// Keys a value can match against a trigger set.
///
/// Arrays contribute one key per non-null element, scalars one key, `null`
/// none at all.
pub fn trigger_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(loose_string).collect(),
        other => loose_string(other).into_iter().collect(),
    }
}

/// Numeric reading of a value: numbers as-is, strings parsed after trimming.
///
/// Empty strings are not numbers here; callers decide what emptiness means.
pub fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
        _ => None,
    }
}

/// Whether a value counts as "not filled in".
///
/// `null`, the empty string, the empty array and a unit tuple whose magnitude
/// is missing are empty, whether or not the tuple names a unit. `false` and
/// `0` are answers, not emptiness.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => {
            items.is_empty()
                || (items.len() == 2
                    && items[0].is_null()
                    && (items[1].is_string() || items[1].is_null()))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_floats_render_without_fraction() {
        assert_eq!(loose_string(&json!(42.0)).unwrap(), "42");
        assert_eq!(loose_string(&json!(-3.0)).unwrap(), "-3");
        assert_eq!(loose_string(&json!(1.5)).unwrap(), "1.5");
        assert_eq!(loose_string(&json!(0.0)).unwrap(), "0");
    }

    #[test]
    fn test_exponent_range_matches_browser_rendering() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e25), "-2.5e+25");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(loose_string(&json!(1e300)).unwrap(), "1e+300");
        assert_eq!(loose_string(&json!(0.00000012)).unwrap(), "1.2e-7");
    }

    #[test]
    fn test_scalars_and_arrays() {
        assert_eq!(loose_string(&json!(true)).unwrap(), "true");
        assert_eq!(loose_string(&json!("yes")).unwrap(), "yes");
        assert_eq!(loose_string(&json!([1, "a", null])).unwrap(), "1,a,");
        assert!(loose_string(&Value::Null).is_none());
    }

    #[test]
    fn test_trigger_keys() {
        assert_eq!(trigger_keys(&json!(["a", 2, null])), vec!["a", "2"]);
        assert_eq!(trigger_keys(&json!(false)), vec!["false"]);
        assert!(trigger_keys(&Value::Null).is_empty());
    }

    #[test]
    fn test_loose_number() {
        assert_eq!(loose_number(&json!(" 42 ")), Some(42.0));
        assert_eq!(loose_number(&json!(7)), Some(7.0));
        assert_eq!(loose_number(&json!("abc")), None);
        assert_eq!(loose_number(&json!("")), None);
        assert_eq!(loose_number(&json!("inf")), None);
        assert_eq!(loose_number(&json!(true)), None);
    }

    #[test]
    fn test_emptiness() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!([null, "cm"])));
        assert!(is_empty_value(&json!([null, null])));
        assert!(!is_empty_value(&json!([0, "cm"])));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(" ")));
    }
}
