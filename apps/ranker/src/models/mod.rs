// Request-side records scored by the engine.
// Every field is optional on the wire; absent or malformed values resolve to
// empty/zero here so nothing downstream has to special-case them.

pub mod job;
pub mod student;

pub use job::JobPosting;
pub use student::StudentProfile;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Scalar text: strings pass through, numbers are stringified (numeric ids),
/// anything else is `None`.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lenient optional string. A wrong-typed value is dropped on its own instead
/// of failing the enclosing record.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// Lenient required string: like `lenient_string`, but absent values are empty.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Lenient string list: an array keeps only its string members, a bare string
/// becomes a one-element list, anything else is empty.
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// Lenient number: JSON numbers pass through, numeric strings (optionally with a
/// trailing `%`) are parsed, everything else is `None`.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Lenient list of arbitrary entries: non-arrays collapse to an empty list.
pub(crate) fn entry_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
        _ => Vec::new(),
    })
}

/// Lenient embedding: a numeric array is kept only if every member is a number.
pub(crate) fn embedding<'de, D>(deserializer: D) -> Result<Option<Vec<f32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(None);
    };
    let vector: Option<Vec<f32>> = items
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect();
    Ok(vector.filter(|v| !v.is_empty()))
}
