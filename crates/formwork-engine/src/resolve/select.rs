//! Select: one value out of `settings.options`.

use super::{live_or_prior, single};
use crate::context::FormContext;
use crate::field::FieldInit;
use crate::schema::Field;
use crate::vars::VariableBag;
use serde_json::{Value, json};

/// The first option's value; options are `{label, value}` objects or bare
/// scalars, listed under `settings.options` or on the field.
pub fn first_option(field: &Field) -> Option<Value> {
    let options = field
        .setting("options")
        .or_else(|| field.extra.get("options"))
        .and_then(Value::as_array)?;
    let first = options.first()?;
    match first {
        Value::Object(option) => option.get("value").cloned(),
        scalar => Some(scalar.clone()),
    }
}

pub fn live_value(field: &Field, variables: &VariableBag) -> Option<Value> {
    live_or_prior(field, variables).or_else(|| first_option(field))
}

pub fn init(field: &Field, variables: &VariableBag) -> FieldInit {
    let live = live_value(field, variables);
    FieldInit {
        init_state: json!({}),
        init_validation: Some(FieldInit::validated(live.is_some())),
        init_vars: Some(single(field, live)),
    }
}

pub fn final_variables(
    variables: &VariableBag,
    field: &Field,
    _state: Option<&Value>,
    _context: &FormContext,
) -> VariableBag {
    single(field, live_value(field, variables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::test_support::{bag, field_of};

    #[test]
    fn falls_back_to_first_option() {
        let field = field_of(json!({
            "type": "select", "variable": "region",
            "settings": {"options": [{"label": "US", "value": "us-east-1"}, {"label": "EU", "value": "eu-west-1"}]}
        }));
        assert_eq!(live_value(&field, &VariableBag::new()), Some(json!("us-east-1")));
        assert_eq!(
            live_value(&field, &bag(json!({"region": "eu-west-1"}))),
            Some(json!("eu-west-1"))
        );
    }

    #[test]
    fn scalar_options_on_the_field_work_too() {
        let field = field_of(json!({"type": "select", "variable": "tier", "options": ["small", "large"]}));
        let out = final_variables(&VariableBag::new(), &field, None, &FormContext::default());
        assert_eq!(Value::Object(out), json!({"tier": "small"}));
    }

    #[test]
    fn no_options_and_no_value_stays_unvalidated() {
        let field = field_of(json!({"type": "select", "variable": "tier"}));
        let init = init(&field, &VariableBag::new());
        assert_eq!(init.init_validation, Some(FieldInit::validated(false)));
        assert_eq!(init.init_vars, Some(VariableBag::new()));
    }
}
