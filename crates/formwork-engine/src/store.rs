//! The form state store.
//!
//! All per-field component state, validation flags and the shared variable
//! environment live in one [`FormState`]. It changes only through
//! [`reduce`], which consumes the prior snapshot and one [`Action`] and
//! returns the next snapshot. [`FormStore`] is the host-owned instance that
//! threads snapshots through `reduce` and holds the variable overrides.

use crate::digest::SchemaDigest;
use crate::field::FieldInit;
use crate::schema::FieldId;
use crate::vars::{VariableBag, merge_into};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentState {
    pub state: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub validated: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Validation {
    pub fn validated(validated: bool) -> Self {
        Self {
            validated,
            extra: Map::new(),
        }
    }

    /// `{validated: false, ...overrides}`.
    fn seeded(overrides: Option<Map<String, Value>>) -> Self {
        let mut validation = Self::validated(false);
        for (key, value) in overrides.unwrap_or_default() {
            match (key.as_str(), value) {
                ("validated", Value::Bool(flag)) => validation.validated = flag,
                (_, value) => {
                    validation.extra.insert(key, value);
                }
            }
        }
        validation
    }
}

pub type ComponentMap = BTreeMap<FieldId, ComponentState>;
pub type ValidationMap = BTreeMap<FieldId, Validation>;

/// One immutable snapshot of the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormState {
    pub components: ComponentMap,
    pub validation: ValidationMap,
    pub variables: VariableBag,
}

pub type StateUpdate = Box<dyn FnOnce(Option<&Value>) -> Value>;
pub type ValidationUpdate = Box<dyn FnOnce(Option<&Validation>) -> Validation>;
pub type VariablesUpdate = Box<dyn FnOnce(&VariableBag) -> VariableBag>;

/// The only mutation surface of the store.
pub enum Action {
    /// Mount a field. No-op when `id` already has component state.
    InitField {
        id: FieldId,
        init_value: Value,
        init_validation: Option<Map<String, Value>>,
        init_vars: Option<VariableBag>,
    },
    /// Shallow-merge the update's result into the field's component state.
    UpdateField { id: FieldId, update: StateUpdate },
    /// Replace the field's validation entry with the update's result.
    UpdateValidation { id: FieldId, update: ValidationUpdate },
    /// Merge the mutation's result into the shared variables.
    MutateVars { mutate: VariablesUpdate },
}

impl Action {
    pub fn init_field(id: FieldId, init: FieldInit) -> Self {
        Action::InitField {
            id,
            init_value: init.init_state,
            init_validation: init.init_validation,
            init_vars: init.init_vars,
        }
    }

    pub fn update_field(id: FieldId, update: impl FnOnce(Option<&Value>) -> Value + 'static) -> Self {
        Action::UpdateField {
            id,
            update: Box::new(update),
        }
    }

    pub fn update_validation(
        id: FieldId,
        update: impl FnOnce(Option<&Validation>) -> Validation + 'static,
    ) -> Self {
        Action::UpdateValidation {
            id,
            update: Box::new(update),
        }
    }

    pub fn mutate_vars(mutate: impl FnOnce(&VariableBag) -> VariableBag + 'static) -> Self {
        Action::MutateVars {
            mutate: Box::new(mutate),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::InitField { .. } => "init-field",
            Action::UpdateField { .. } => "update-field",
            Action::UpdateValidation { .. } => "update-validation",
            Action::MutateVars { .. } => "mutate-vars",
        }
    }

    pub fn field_id(&self) -> Option<&FieldId> {
        match self {
            Action::InitField { id, .. }
            | Action::UpdateField { id, .. }
            | Action::UpdateValidation { id, .. } => Some(id),
            Action::MutateVars { .. } => None,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Action");
        out.field("kind", &self.kind());
        if let Some(id) = self.field_id() {
            out.field("id", id);
        }
        out.finish()
    }
}

/// Pure state transition.
///
/// `overrides` are re-applied last on every `update-field` and
/// `mutate-vars`, so they win over whatever a field wrote.
pub fn reduce(mut state: FormState, action: Action, overrides: &VariableBag) -> FormState {
    match action {
        Action::InitField {
            id,
            init_value,
            init_validation,
            init_vars,
        } => {
            if state.components.contains_key(&id) {
                return state;
            }
            if let Some(vars) = init_vars {
                merge_into(&mut state.variables, &vars);
            }
            state
                .validation
                .insert(id.clone(), Validation::seeded(init_validation));
            state
                .components
                .insert(id, ComponentState { state: init_value });
        }
        Action::UpdateField { id, update } => {
            let current = state.components.get(&id).map(|c| &c.state);
            let patch = update(current);
            let entry = state.components.entry(id).or_default();
            shallow_merge(&mut entry.state, patch);
            merge_into(&mut state.variables, overrides);
        }
        Action::UpdateValidation { id, update } => {
            let next = update(state.validation.get(&id));
            state.validation.insert(id, next);
        }
        Action::MutateVars { mutate } => {
            let patch = mutate(&state.variables);
            merge_into(&mut state.variables, &patch);
            merge_into(&mut state.variables, overrides);
        }
    }
    state
}

/// `{...target, ...patch}` for objects; anything else replaces.
fn shallow_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(current), Value::Object(patch)) => current.extend(patch),
        (target, patch) => *target = patch,
    }
}

/// The single host-owned store for one schema instance.
#[derive(Debug, Clone)]
pub struct FormStore {
    digest: SchemaDigest,
    state: FormState,
    overrides: VariableBag,
    pub(crate) registered: BTreeSet<FieldId>,
    revision: u64,
}

impl FormStore {
    /// Create the store for the schema identified by `digest`.
    ///
    /// `initial` seeds the variables; `overrides` are applied on top and
    /// re-applied after every variable-affecting action.
    pub fn new(digest: SchemaDigest, initial: VariableBag, overrides: VariableBag) -> Self {
        let mut variables = initial;
        merge_into(&mut variables, &overrides);
        Self {
            digest,
            state: FormState {
                variables,
                ..FormState::default()
            },
            overrides,
            registered: BTreeSet::new(),
            revision: 0,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        tracing::debug!(
            action = action.kind(),
            id = action.field_id().map(FieldId::as_str),
            revision = self.revision + 1,
            "dispatch"
        );
        let prior = std::mem::take(&mut self.state);
        self.state = reduce(prior, action, &self.overrides);
        self.revision += 1;
    }

    pub fn digest(&self) -> &SchemaDigest {
        &self.digest
    }

    /// The current snapshot.
    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn variables(&self) -> &VariableBag {
        &self.state.variables
    }

    pub fn overrides(&self) -> &VariableBag {
        &self.overrides
    }

    /// Component state; `None` until the field is initialised.
    pub fn component(&self, id: &str) -> Option<&Value> {
        self.state.components.get(id).map(|c| &c.state)
    }

    /// Validation entry; `None` until the field is initialised.
    pub fn validation(&self, id: &str) -> Option<&Validation> {
        self.state.validation.get(id)
    }

    /// Number of actions applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> VariableBag {
        value.as_object().cloned().unwrap_or_default()
    }

    fn id(raw: &str) -> FieldId {
        FieldId::new(raw)
    }

    fn init(raw_id: &str, value: Value, vars: Value) -> Action {
        Action::InitField {
            id: id(raw_id),
            init_value: value,
            init_validation: None,
            init_vars: Some(bag(vars)),
        }
    }

    #[test]
    fn init_field_is_idempotent() {
        let overrides = VariableBag::new();
        let once = reduce(FormState::default(), init("0-0-0", json!({"a": 1}), json!({"x": 1})), &overrides);
        let twice = reduce(once.clone(), init("0-0-0", json!({"a": 2}), json!({"x": 2})), &overrides);
        assert_eq!(once, twice);
        assert_eq!(once.components[&id("0-0-0")].state, json!({"a": 1}));
        assert_eq!(once.validation[&id("0-0-0")], Validation::validated(false));
        assert_eq!(once.variables["x"], json!(1));
    }

    #[test]
    fn init_validation_overrides_default_flag() {
        let action = Action::InitField {
            id: id("0-0-0"),
            init_value: Value::Null,
            init_validation: Some(bag(json!({"validated": true, "message": "ok"}))),
            init_vars: None,
        };
        let state = reduce(FormState::default(), action, &VariableBag::new());
        let validation = &state.validation[&id("0-0-0")];
        assert!(validation.validated);
        assert_eq!(validation.extra["message"], json!("ok"));
    }

    #[test]
    fn update_field_merges_shallowly_and_reapplies_overrides() {
        let overrides = bag(json!({"locked": "yes"}));
        let mut state = reduce(
            FormState::default(),
            init("0-0-0", json!({"a": 1, "b": {"c": 1}}), json!({"locked": "no"})),
            &overrides,
        );
        assert_eq!(state.variables["locked"], json!("no"));

        state = reduce(
            state,
            Action::update_field(id("0-0-0"), |_| json!({"b": {"d": 2}})),
            &overrides,
        );
        assert_eq!(state.components[&id("0-0-0")].state, json!({"a": 1, "b": {"d": 2}}));
        assert_eq!(state.variables["locked"], json!("yes"));
    }

    #[test]
    fn update_validation_replaces_the_entry() {
        let overrides = VariableBag::new();
        let mut state = reduce(
            FormState::default(),
            Action::InitField {
                id: id("0-0-0"),
                init_value: Value::Null,
                init_validation: Some(bag(json!({"hint": "x"}))),
                init_vars: None,
            },
            &overrides,
        );
        state = reduce(
            state,
            Action::update_validation(id("0-0-0"), |_| Validation::validated(true)),
            &overrides,
        );
        assert_eq!(state.validation[&id("0-0-0")], Validation::validated(true));
    }

    #[test]
    fn mutate_vars_keeps_overrides_sticky() {
        let overrides = bag(json!({"region": "us-east-1"}));
        let mut state = FormState::default();
        state = reduce(
            state,
            Action::mutate_vars(|_| bag(json!({"region": "eu-west-1", "replicas": 3}))),
            &overrides,
        );
        assert_eq!(state.variables["region"], json!("us-east-1"));
        assert_eq!(state.variables["replicas"], json!(3));

        state = reduce(
            state,
            Action::mutate_vars(|vars| {
                let next = vars["replicas"].as_i64().unwrap_or(0) + 1;
                bag(json!({"replicas": next}))
            }),
            &overrides,
        );
        assert_eq!(state.variables["replicas"], json!(4));
    }

    #[test]
    fn actions_on_uninitialised_fields_do_not_fail() {
        let overrides = VariableBag::new();
        let state = reduce(
            FormState::default(),
            Action::update_field(id("9-9-9"), |current| {
                assert!(current.is_none());
                json!({"touched": true})
            }),
            &overrides,
        );
        assert_eq!(state.components[&id("9-9-9")].state, json!({"touched": true}));
        assert!(!state.validation.contains_key("9-9-9"));

        let mut store = FormStore::new(SchemaDigest::new("fs1_test"), VariableBag::new(), overrides);
        assert!(store.component("0-0-0").is_none());
        assert!(store.validation("0-0-0").is_none());
        store.dispatch(Action::update_validation(id("0-0-0"), |current| {
            assert!(current.is_none());
            Validation::validated(false)
        }));
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn store_applies_overrides_at_creation() {
        let store = FormStore::new(
            SchemaDigest::new("fs1_test"),
            bag(json!({"a": 1, "b": 1})),
            bag(json!({"b": 2})),
        );
        assert_eq!(Value::Object(store.variables().clone()), json!({"a": 1, "b": 2}));
    }
}
