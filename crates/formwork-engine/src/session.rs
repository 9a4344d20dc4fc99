//! Host-side composition of the engine.
//!
//! A [`FormSession`] owns one normalized schema and the single store built
//! for it. Every field of the active schema is registered once at
//! construction, before anything can read it, and fields revealed by later
//! variable edits are registered as they appear. Swapping in a schema with
//! a different digest discards the store and builds a fresh one.

use crate::config::EngineConfig;
use crate::context::FormContext;
use crate::digest::schema_digest;
use crate::error::FormError;
use crate::field::FieldHandle;
use crate::normalize::{normalize, seed_variables};
use crate::required::{RequiredFields, compute_required, is_valid, missing_required};
use crate::resolve::{ResolverRegistry, Submission, resolve_submission};
use crate::schema::{ActiveSchema, FieldId, NormalizedSchema};
use crate::store::{Action, FormStore};
use crate::vars::{VariableBag, merge_into};
use serde_json::Value;

pub struct FormSession {
    schema: NormalizedSchema,
    store: FormStore,
    context: FormContext,
    overrides: VariableBag,
    registry: ResolverRegistry,
    include_metadata: bool,
}

impl FormSession {
    /// Build a session with the built-in resolver tables.
    pub fn new(raw: &Value, config: &EngineConfig) -> Result<Self, FormError> {
        Self::with_registry(raw, config, ResolverRegistry::builtin())
    }

    pub fn with_registry(
        raw: &Value,
        config: &EngineConfig,
        registry: ResolverRegistry,
    ) -> Result<Self, FormError> {
        let schema = normalize(raw)?;
        let context = config.context.clone();
        let overrides = config.override_variables()?;
        let store = build_store(raw, &schema, &context, &overrides);
        Ok(Self {
            schema,
            store,
            context,
            overrides,
            registry,
            include_metadata: config.include_metadata,
        })
    }

    /// Swap the schema. Returns `true` when the digest changed and the
    /// store was recreated, `false` when the document is the same.
    pub fn replace_schema(&mut self, raw: &Value) -> Result<bool, FormError> {
        if schema_digest(raw) == *self.store.digest() {
            return Ok(false);
        }
        let schema = normalize(raw)?;
        let store = build_store(raw, &schema, &self.context, &self.overrides);
        tracing::info!(
            previous = %self.store.digest(),
            next = %store.digest(),
            drifted = self.schema.id_drift(&schema).len(),
            "schema replaced; store recreated"
        );
        self.schema = schema;
        self.store = store;
        Ok(true)
    }

    pub fn schema(&self) -> &NormalizedSchema {
        &self.schema
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    /// Apply one action, then mount any field it revealed.
    pub fn dispatch(&mut self, action: Action) {
        self.store.dispatch(action);
        let mounted = self.store.mount_active(&self.schema);
        if mounted > 0 {
            tracing::debug!(mounted, "mounted revealed fields");
        }
    }

    pub fn field(&mut self, id: FieldId) -> FieldHandle<'_> {
        self.store.field_in(&self.schema, id)
    }

    /// Sections visible under the current variables.
    pub fn active(&self) -> ActiveSchema<'_> {
        self.schema.active(self.store.variables())
    }

    pub fn required(&self) -> RequiredFields {
        compute_required(&self.active())
    }

    pub fn is_valid(&self) -> bool {
        is_valid(&self.required().required_ids, &self.store.state().validation)
    }

    pub fn missing_required(&self) -> Vec<FieldId> {
        let required = self.required();
        missing_required(&required.required_ids, &self.store.state().validation)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Resolve the submission payload without the validity gate.
    ///
    /// Folds over the active schema, or over every field when the schema
    /// sets `includeHiddenFields`.
    pub fn resolve(&self, with_metadata: bool) -> Submission {
        let view = if self.schema.include_hidden_fields {
            self.schema.unfiltered()
        } else {
            self.active()
        };
        let state = self.store.state();
        resolve_submission(
            &self.registry,
            &state.variables,
            &view,
            &state.components,
            &self.context,
            with_metadata,
        )
    }

    /// Validate, resolve, and hand the payload to `on_submit`.
    pub fn submit(&self, on_submit: impl FnOnce(Submission)) -> Result<(), FormError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            tracing::debug!(missing = missing.len(), "submit blocked");
            return Err(FormError::MissingRequiredFields {
                missing: missing.into_iter().map(|id| id.to_string()).collect(),
            });
        }
        on_submit(self.resolve(self.include_metadata));
        Ok(())
    }
}

fn build_store(
    raw: &Value,
    schema: &NormalizedSchema,
    context: &FormContext,
    overrides: &VariableBag,
) -> FormStore {
    let mut initial = context.injected_variables();
    merge_into(&mut initial, &seed_variables(raw));
    let mut store = FormStore::new(schema_digest(raw), initial, overrides.clone());
    store.mount_active(schema);
    store
}
