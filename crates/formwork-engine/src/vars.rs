//! The shared variable environment and the small value helpers every
//! resolver leans on.

use serde_json::{Map, Number, Value};

/// The flat key → value namespace shared by every field.
///
/// Keys are dotted-path strings (`container.env`), not nested objects.
pub type VariableBag = Map<String, Value>;

/// Shallow object-spread merge: every key of `patch` overwrites `base`.
pub fn merge_into(base: &mut VariableBag, patch: &VariableBag) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}

/// `{...base, ...patch}` without mutating either side.
pub fn merged(base: &VariableBag, patch: &VariableBag) -> VariableBag {
    let mut out = base.clone();
    merge_into(&mut out, patch);
    out
}

/// Loose truthiness for variable lookups.
///
/// `null`, `false`, `0`, `NaN` and the empty string are falsy; arrays and
/// objects are truthy even when empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Parse a trimmed string as a JSON number, integers first.
pub fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Whether a revision/default value carries anything worth pre-validating.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// Render a scalar as the string a text input would hold.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
