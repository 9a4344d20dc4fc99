//! Free-text kinds (`cron`, `text-area`): the live string, unchanged.

use super::{live_or_prior, single};
use crate::context::FormContext;
use crate::field::FieldInit;
use crate::schema::Field;
use crate::vars::VariableBag;
use serde_json::{Value, json};

pub fn init(field: &Field, variables: &VariableBag) -> FieldInit {
    FieldInit {
        init_state: json!({}),
        init_vars: Some(single(field, live_or_prior(field, variables))),
        init_validation: Some(FieldInit::validated(FieldInit::has_initial_value(field))),
    }
}

pub fn final_variables(
    variables: &VariableBag,
    field: &Field,
    _state: Option<&Value>,
    _context: &FormContext,
) -> VariableBag {
    single(field, live_or_prior(field, variables))
}
