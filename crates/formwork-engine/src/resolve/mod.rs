//! Submission resolution.
//!
//! Two lookup tables map a field's type tag to an optional pure function.
//! `final_variables` functions contribute a partial variable bag;
//! `metadata` functions contribute auxiliary submission data. Resolution
//! starts from a copy of the variables and folds every active field's
//! contribution in document order with last-write-wins shallow merges:
//! two fields that target the same key clobber each other, and the later
//! one in the document wins.

pub mod array_input;
pub mod checkbox;
pub mod input;
pub mod key_value;
pub mod select;
pub mod text;

use crate::context::FormContext;
use crate::schema::{ActiveSchema, Field, FieldKind};
use crate::store::ComponentMap;
use crate::vars::{VariableBag, merge_into};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// `(variables, field, component state, context) -> partial bag`.
pub type FinalVariablesFn =
    fn(&VariableBag, &Field, Option<&Value>, &FormContext) -> VariableBag;

/// Same shape as [`FinalVariablesFn`], folded into the metadata bag.
pub type MetadataFn = fn(&VariableBag, &Field, Option<&Value>, &FormContext) -> VariableBag;

/// Built-in `final_variables` per kind. The match is exhaustive so a new
/// [`FieldKind`] cannot be added without deciding its resolver.
fn builtin_final_variables(kind: FieldKind) -> Option<FinalVariablesFn> {
    match kind {
        FieldKind::Input => Some(input::final_variables),
        FieldKind::Checkbox => Some(checkbox::final_variables),
        FieldKind::KeyValueArray => Some(key_value::final_variables),
        FieldKind::ArrayInput => Some(array_input::final_variables),
        FieldKind::Select => Some(select::final_variables),
        FieldKind::Cron | FieldKind::TextArea => Some(text::final_variables),
        FieldKind::Heading
        | FieldKind::Subtitle
        | FieldKind::ServiceIpList
        | FieldKind::ResourceList
        | FieldKind::VeleroCreateBackup
        | FieldKind::Unknown => None,
    }
}

fn builtin_metadata(kind: FieldKind) -> Option<MetadataFn> {
    match kind {
        FieldKind::KeyValueArray => Some(key_value::metadata),
        FieldKind::Heading
        | FieldKind::Subtitle
        | FieldKind::Input
        | FieldKind::Checkbox
        | FieldKind::ArrayInput
        | FieldKind::Select
        | FieldKind::ServiceIpList
        | FieldKind::ResourceList
        | FieldKind::VeleroCreateBackup
        | FieldKind::Cron
        | FieldKind::TextArea
        | FieldKind::Unknown => None,
    }
}

/// Type-tag → resolver tables.
///
/// Built-in kinds are registered under their canonical tag; plugin kinds
/// register under their own tag and are found through `Field::type_name`.
#[derive(Debug, Clone)]
pub struct ResolverRegistry {
    final_variables: BTreeMap<String, FinalVariablesFn>,
    metadata: BTreeMap<String, MetadataFn>,
}

impl ResolverRegistry {
    /// Tables with no entries: every field falls back to `variables`.
    pub fn empty() -> Self {
        Self {
            final_variables: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kind in FieldKind::ALL {
            if let Some(resolver) = builtin_final_variables(kind) {
                registry.register_final_variables(kind.as_str(), resolver);
            }
            if let Some(resolver) = builtin_metadata(kind) {
                registry.register_metadata(kind.as_str(), resolver);
            }
        }
        registry
    }

    /// Register (or replace) the `final_variables` function for a tag.
    pub fn register_final_variables(
        &mut self,
        type_name: impl Into<String>,
        resolver: FinalVariablesFn,
    ) -> Option<FinalVariablesFn> {
        self.final_variables.insert(type_name.into(), resolver)
    }

    /// Register (or replace) the `metadata` function for a tag.
    pub fn register_metadata(
        &mut self,
        type_name: impl Into<String>,
        resolver: MetadataFn,
    ) -> Option<MetadataFn> {
        self.metadata.insert(type_name.into(), resolver)
    }

    pub fn final_variables_for(&self, field: &Field) -> Option<FinalVariablesFn> {
        self.final_variables.get(&field.type_name).copied()
    }

    pub fn metadata_for(&self, field: &Field) -> Option<MetadataFn> {
        self.metadata.get(&field.type_name).copied()
    }

    /// Registered tags, sorted.
    pub fn final_variable_tags(&self) -> Vec<&str> {
        self.final_variables.keys().map(String::as_str).collect()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The payload handed to the submit callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub values: VariableBag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VariableBag>,
}

/// Fold every field's contribution on top of a copy of `variables`.
///
/// Each resolver sees the unfolded `variables`, never the accumulating
/// result. The metadata pass runs only when `with_metadata` is set and
/// starts from an empty bag.
pub fn resolve_submission(
    registry: &ResolverRegistry,
    variables: &VariableBag,
    schema: &ActiveSchema<'_>,
    components: &ComponentMap,
    context: &FormContext,
    with_metadata: bool,
) -> Submission {
    let values = fold(variables.clone(), schema, |field| {
        registry
            .final_variables_for(field)
            .map(|resolver| resolver(variables, field, state_of(components, field), context))
    });

    let metadata = with_metadata.then(|| {
        fold(VariableBag::new(), schema, |field| {
            registry
                .metadata_for(field)
                .map(|resolver| resolver(variables, field, state_of(components, field), context))
        })
    });

    Submission { values, metadata }
}

fn fold(
    mut acc: VariableBag,
    schema: &ActiveSchema<'_>,
    mut contribute: impl FnMut(&Field) -> Option<VariableBag>,
) -> VariableBag {
    for field in schema.fields() {
        if let Some(contribution) = contribute(field) {
            tracing::debug!(
                id = %field.id,
                field_type = %field.type_name,
                keys = contribution.len(),
                "resolved field"
            );
            merge_into(&mut acc, &contribution);
        }
    }
    acc
}

fn state_of<'a>(components: &'a ComponentMap, field: &Field) -> Option<&'a Value> {
    components.get(field.id.as_str()).map(|c| &c.state)
}

/// Live variable ▸ revision `value[0]` ▸ `settings.default`.
pub(crate) fn live_or_prior(field: &Field, variables: &VariableBag) -> Option<Value> {
    field
        .variable
        .as_deref()
        .and_then(|name| variables.get(name))
        .filter(|v| !v.is_null())
        .or_else(|| field.revision_value())
        .or_else(|| field.default_value())
        .cloned()
}

/// `{variable: value}`, or nothing when the field has no variable.
pub(crate) fn single(field: &Field, value: Option<Value>) -> VariableBag {
    let mut bag = VariableBag::new();
    if let (Some(name), Some(value)) = (field.variable.as_ref(), value) {
        bag.insert(name.clone(), value);
    }
    bag
}


#[cfg(test)]
mod tests {
    use super::test_support::{bag, schema_of};
    use super::*;
    use crate::store::ComponentState;
    use serde_json::json;

    fn constant_a(_: &VariableBag, _: &Field, _: Option<&Value>, _: &FormContext) -> VariableBag {
        bag(json!({"shared": "a"}))
    }

    fn constant_b(_: &VariableBag, _: &Field, _: Option<&Value>, _: &FormContext) -> VariableBag {
        bag(json!({"shared": "b"}))
    }

    #[test]
    fn later_field_wins_when_variables_collide() {
        let schema = schema_of(json!([
            {"type": "first", "variable": "shared"},
            {"type": "second", "variable": "shared"}
        ]));
        let mut registry = ResolverRegistry::empty();
        registry.register_final_variables("first", constant_a);
        registry.register_final_variables("second", constant_b);

        let submission = resolve_submission(
            &registry,
            &VariableBag::new(),
            &schema.unfiltered(),
            &ComponentMap::new(),
            &FormContext::default(),
            false,
        );
        assert_eq!(submission.values["shared"], json!("b"));
        assert!(submission.metadata.is_none());
    }

    #[test]
    fn unregistered_kinds_fall_back_to_variables() {
        let schema = schema_of(json!([
            {"type": "heading", "label": "x"},
            {"type": "resource-list", "variable": "pods"}
        ]));
        let vars = bag(json!({"pods": ["a"], "extra": 1}));
        let submission = resolve_submission(
            &ResolverRegistry::builtin(),
            &vars,
            &schema.unfiltered(),
            &ComponentMap::new(),
            &FormContext::default(),
            true,
        );
        assert_eq!(submission.values, vars);
        assert_eq!(submission.metadata, Some(VariableBag::new()));
    }

    #[test]
    fn builtin_registry_covers_input_kinds() {
        let registry = ResolverRegistry::builtin();
        assert_eq!(
            registry.final_variable_tags(),
            vec![
                "array-input",
                "checkbox",
                "cron",
                "input",
                "key-value-array",
                "select",
                "text-area"
            ]
        );
    }

    #[test]
    fn resolvers_see_component_state() {
        fn from_state(
            _: &VariableBag,
            field: &Field,
            state: Option<&Value>,
            _: &FormContext,
        ) -> VariableBag {
            single(field, state.and_then(|s| s.get("picked")).cloned())
        }
        let schema = schema_of(json!([{"type": "picker", "variable": "choice"}]));
        let mut registry = ResolverRegistry::empty();
        registry.register_final_variables("picker", from_state);
        let mut components = ComponentMap::new();
        components.insert(
            schema.fields()[0].id.clone(),
            ComponentState {
                state: json!({"picked": 7}),
            },
        );
        let submission = resolve_submission(
            &registry,
            &VariableBag::new(),
            &schema.unfiltered(),
            &components,
            &FormContext::default(),
            false,
        );
        assert_eq!(submission.values["choice"], json!(7));
    }
}
