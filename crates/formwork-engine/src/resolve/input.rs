//! Text and numeric inputs, optionally carrying a unit suffix.
//!
//! Revision values are stored with their unit (`"256Mi"`); the live,
//! editable value has it stripped (`"256"`) and resolution appends it
//! again unless `omitUnitFromValue` is set.

use super::single;
use crate::context::FormContext;
use crate::field::FieldInit;
use crate::schema::Field;
use crate::vars::{VariableBag, as_text, parse_number};
use serde_json::{Value, json};

pub fn unit(field: &Field) -> Option<&str> {
    field.setting_str("unit").filter(|u| !u.is_empty())
}

fn strip_unit(value: &Value, unit: Option<&str>) -> Value {
    match (value, unit) {
        (Value::String(text), Some(unit)) => {
            Value::String(text.strip_suffix(unit).unwrap_or(text).to_string())
        }
        _ => value.clone(),
    }
}

/// Live variable ▸ unit-stripped revision `value[0]` ▸ `settings.default`.
pub fn live_value(field: &Field, variables: &VariableBag) -> Option<Value> {
    field
        .variable
        .as_deref()
        .and_then(|name| variables.get(name))
        .filter(|v| !v.is_null())
        .cloned()
        .or_else(|| {
            field
                .revision_value()
                .map(|prior| strip_unit(prior, unit(field)))
        })
        .or_else(|| field.default_value().cloned())
}

pub fn init(field: &Field, variables: &VariableBag) -> FieldInit {
    FieldInit {
        init_state: json!({}),
        init_vars: Some(single(field, live_value(field, variables))),
        init_validation: Some(FieldInit::validated(FieldInit::has_initial_value(field))),
    }
}

pub fn final_variables(
    variables: &VariableBag,
    field: &Field,
    _state: Option<&Value>,
    _context: &FormContext,
) -> VariableBag {
    let resolved = live_value(field, variables).map(|live| {
        match (unit(field), field.flag("omitUnitFromValue")) {
            (Some(unit), false) => match as_text(&live) {
                Some(text) if text.ends_with(unit) => Value::String(text),
                Some(text) => Value::String(format!("{text}{unit}")),
                // Lists and objects carry no unit.
                None => live,
            },
            _ if field.setting_str("type") == Some("number") => {
                let parsed = live.as_str().and_then(parse_number);
                parsed.map(Value::Number).unwrap_or(live)
            }
            _ => live,
        }
    });
    single(field, resolved)
}
