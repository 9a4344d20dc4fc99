//! Required-field analysis and the aggregate validity verdict.

use crate::schema::{ActiveSchema, FieldId};
use crate::store::ValidationMap;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredFields {
    /// Ids of active input fields flagged `required`, in document order.
    pub required_ids: Vec<FieldId>,
    /// Every active input field's id, grouped by its variable.
    pub variable_to_fields: BTreeMap<String, Vec<FieldId>>,
}

/// Walk the active schema, skipping display-only kinds.
///
/// Only fields in visible sections are considered, so a required field in
/// a hidden section never blocks submission.
pub fn compute_required(schema: &ActiveSchema<'_>) -> RequiredFields {
    let mut out = RequiredFields::default();
    for field in schema.fields() {
        if !field.kind().is_input() {
            continue;
        }
        if field.required {
            out.required_ids.push(field.id.clone());
        }
        if let Some(variable) = &field.variable {
            out.variable_to_fields
                .entry(variable.clone())
                .or_default()
                .push(field.id.clone());
        }
    }
    out
}

/// `true` iff every required id is validated. Vacuously `true` when
/// nothing is required.
pub fn is_valid(required_ids: &[FieldId], validation: &ValidationMap) -> bool {
    required_ids
        .iter()
        .all(|id| validation.get(id).is_some_and(|v| v.validated))
}

/// Required ids that are not validated yet.
pub fn missing_required<'a>(
    required_ids: &'a [FieldId],
    validation: &ValidationMap,
) -> Vec<&'a FieldId> {
    required_ids
        .iter()
        .filter(|id| !validation.get(*id).is_some_and(|v| v.validated))
        .collect()
}
