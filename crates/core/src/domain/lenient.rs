//! Serde helpers for upstream numeric fields that arrive as numbers, numeric strings,
//! empty strings, `"-"` placeholders or null.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.as_ref().and_then(value_to_f64))
}

pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.as_ref()
        .and_then(value_to_f64)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u32)
        .unwrap_or(0))
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() || t == "-" {
                return None;
            }
            t.parse::<f64>().ok()
        }
        _ => None,
    }
    .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_f64")]
        x: Option<f64>,
        #[serde(default, deserialize_with = "count")]
        n: u32,
        #[serde(default, deserialize_with = "string")]
        s: String,
    }

    fn probe(v: Value) -> Probe {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        assert_eq!(probe(json!({"x": 1.5})).x, Some(1.5));
        assert_eq!(probe(json!({"x": " 2.25 "})).x, Some(2.25));
        assert_eq!(probe(json!({"n": "7"})).n, 7);
        assert_eq!(probe(json!({"n": 12})).n, 12);
        assert_eq!(probe(json!({"s": 600000})).s, "600000");
    }

    #[test]
    fn placeholders_become_absent() {
        assert_eq!(probe(json!({"x": "-"})).x, None);
        assert_eq!(probe(json!({"x": ""})).x, None);
        assert_eq!(probe(json!({"x": null})).x, None);
        assert_eq!(probe(json!({})).x, None);
        assert_eq!(probe(json!({"n": null})).n, 0);
        assert_eq!(probe(json!({"s": null})).s, "");
    }
}
