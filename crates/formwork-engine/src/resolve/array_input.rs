//! Array input: an ordered list of strings.

use super::single;
use crate::context::FormContext;
use crate::field::FieldInit;
use crate::schema::Field;
use crate::vars::VariableBag;
use serde_json::{Value, json};

fn as_list(value: Option<&Value>) -> Option<Vec<Value>> {
    value.and_then(Value::as_array).cloned()
}

/// Component state ▸ live variable ▸ revision ▸ default ▸ empty, with
/// blank entries dropped. State counts only once a renderer wrote `values`.
pub fn live_values(field: &Field, variables: &VariableBag, state: Option<&Value>) -> Vec<Value> {
    let live = field.variable.as_deref().and_then(|name| variables.get(name));
    let values = as_list(state.and_then(|s| s.get("values")))
        .or_else(|| as_list(live))
        .or_else(|| as_list(field.revision_value()))
        .or_else(|| as_list(field.default_value()))
        .unwrap_or_default();
    values
        .into_iter()
        .filter(|v| !matches!(v, Value::Null) && v.as_str() != Some(""))
        .collect()
}

pub fn init(field: &Field, _variables: &VariableBag) -> FieldInit {
    FieldInit {
        init_state: json!({}),
        init_vars: None,
        init_validation: Some(FieldInit::validated(FieldInit::has_initial_value(field))),
    }
}

pub fn final_variables(
    variables: &VariableBag,
    field: &Field,
    state: Option<&Value>,
    _context: &FormContext,
) -> VariableBag {
    single(field, Some(Value::Array(live_values(field, variables, state))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::test_support::{bag, field_of};

    #[test]
    fn component_state_wins_and_blanks_are_dropped() {
        let field = field_of(json!({"type": "array-input", "variable": "hosts", "value": [["a.com"]]}));
        let state = json!({"values": ["b.com", "", "c.com"]});
        let out = final_variables(&VariableBag::new(), &field, Some(&state), &FormContext::default());
        assert_eq!(Value::Object(out), json!({"hosts": ["b.com", "c.com"]}));
    }

    #[test]
    fn falls_back_to_revision_then_empty() {
        let field = field_of(json!({"type": "array-input", "variable": "hosts", "value": [["a.com"]]}));
        assert_eq!(live_values(&field, &VariableBag::new(), None), vec![json!("a.com")]);
        assert_eq!(
            live_values(&field, &bag(json!({"hosts": ["x"]})), None),
            vec![json!("x")]
        );
        let bare = field_of(json!({"type": "array-input", "variable": "hosts"}));
        assert!(live_values(&bare, &VariableBag::new(), None).is_empty());
    }

    #[test]
    fn registration_state_does_not_shadow_live_variable() {
        let field = field_of(json!({"type": "array-input", "variable": "hosts", "value": [["a.com"]]}));
        let init = init(&field, &VariableBag::new());
        let live = bag(json!({"hosts": ["x.com"]}));
        let out = final_variables(&live, &field, Some(&init.init_state), &FormContext::default());
        assert_eq!(Value::Object(out), json!({"hosts": ["x.com"]}));
    }
}
