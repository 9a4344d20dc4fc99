//! Checkbox: a boolean under its variable.

use super::single;
use crate::context::FormContext;
use crate::field::FieldInit;
use crate::schema::Field;
use crate::vars::VariableBag;
use serde_json::{Value, json};

/// Live boolean ▸ revision `value[0]` ▸ `settings.default` ▸ `false`.
pub fn live_value(field: &Field, variables: &VariableBag) -> bool {
    field
        .variable
        .as_deref()
        .and_then(|name| variables.get(name))
        .and_then(Value::as_bool)
        .or_else(|| field.revision_value().and_then(Value::as_bool))
        .or_else(|| field.default_value().and_then(Value::as_bool))
        .unwrap_or(false)
}

pub fn init(field: &Field, variables: &VariableBag) -> FieldInit {
    FieldInit {
        init_state: json!({}),
        init_vars: Some(single(field, Some(Value::Bool(live_value(field, variables))))),
        init_validation: Some(FieldInit::validated(true)),
    }
}

pub fn final_variables(
    variables: &VariableBag,
    field: &Field,
    _state: Option<&Value>,
    _context: &FormContext,
) -> VariableBag {
    single(field, Some(Value::Bool(live_value(field, variables))))
}
