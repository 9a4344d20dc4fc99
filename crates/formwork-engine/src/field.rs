//! Per-field integration with the store.
//!
//! A field is registered exactly once, through an explicit
//! [`FormStore::register_field`] call made by the owning composition before
//! anything reads it. Only fields of the active schema are registered;
//! [`FormStore::mount_active`] picks up the ones a variable edit reveals.
//! Afterwards renderers work through a [`FieldHandle`]:
//! field-scoped reads and `set_state` / `set_validation`, plus `set_vars`,
//! which mutates the shared environment and so may change variables other
//! fields read.

use crate::resolve::{array_input, checkbox, input, key_value, select, text};
use crate::schema::{Field, FieldId, FieldKind, NormalizedSchema};
use crate::store::{Action, FormStore, Validation};
use crate::vars::{VariableBag, is_present};
use serde_json::{Map, Value, json};

/// What a field contributes to the store when it is registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInit {
    pub init_state: Value,
    pub init_vars: Option<VariableBag>,
    pub init_validation: Option<Map<String, Value>>,
}

impl FieldInit {
    /// `{validated: flag}` as an init-validation bag.
    pub fn validated(flag: bool) -> Map<String, Value> {
        let mut bag = Map::new();
        bag.insert("validated".to_string(), Value::Bool(flag));
        bag
    }

    /// A settings default or a non-empty revision value pre-validates a
    /// field, so required fields with defaults never block submission.
    pub fn has_initial_value(field: &Field) -> bool {
        is_present(field.default_value()) || is_present(field.revision_value())
    }
}

/// Derive the registration payload for a normalized field.
///
/// Live values already in `variables` take precedence over revision values
/// and defaults, so seeding never clobbers what is there.
pub fn field_init(field: &Field, variables: &VariableBag) -> FieldInit {
    match field.kind() {
        FieldKind::Checkbox => checkbox::init(field, variables),
        FieldKind::Input => input::init(field, variables),
        FieldKind::Select => select::init(field, variables),
        FieldKind::Cron | FieldKind::TextArea => text::init(field, variables),
        FieldKind::KeyValueArray => key_value::init(field, variables),
        FieldKind::ArrayInput => array_input::init(field, variables),
        FieldKind::Unknown => FieldInit {
            init_state: json!({}),
            init_vars: None,
            init_validation: Some(FieldInit::validated(FieldInit::has_initial_value(field))),
        },
        FieldKind::Heading
        | FieldKind::Subtitle
        | FieldKind::ServiceIpList
        | FieldKind::ResourceList
        | FieldKind::VeleroCreateBackup => FieldInit {
            init_state: json!({}),
            init_vars: None,
            init_validation: Some(FieldInit::validated(true)),
        },
    }
}

impl FormStore {
    /// One-shot registration. Returns `false` (and dispatches nothing) when
    /// the field was already registered.
    pub fn register_field(&mut self, id: FieldId, init: FieldInit) -> bool {
        if self.registered.contains(&id) {
            return false;
        }
        self.registered.insert(id.clone());
        self.dispatch(Action::init_field(id, init));
        true
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.registered.contains(id)
    }

    /// Register every active field that is not registered yet, in document
    /// order. Repeats until nothing new is active, since a mounted field's
    /// init vars can reveal further sections. Returns how many were mounted.
    pub fn mount_active(&mut self, schema: &NormalizedSchema) -> usize {
        let mut mounted = 0;
        loop {
            let pending: Vec<&Field> = schema
                .active(self.variables())
                .fields()
                .filter(|field| !self.is_registered(field.id.as_str()))
                .collect();
            if pending.is_empty() {
                return mounted;
            }
            for field in pending {
                let init = field_init(field, self.variables());
                if self.register_field(field.id.clone(), init) {
                    mounted += 1;
                }
            }
        }
    }

    /// A handle scoped to one field. Reads return `None` until the field is
    /// registered.
    pub fn field(&mut self, id: FieldId) -> FieldHandle<'_> {
        FieldHandle {
            store: self,
            schema: None,
            id,
        }
    }

    /// Like [`FormStore::field`], but `set_vars` also mounts the fields of
    /// `schema` that the edit reveals.
    pub fn field_in<'s>(
        &'s mut self,
        schema: &'s NormalizedSchema,
        id: FieldId,
    ) -> FieldHandle<'s> {
        FieldHandle {
            store: self,
            schema: Some(schema),
            id,
        }
    }
}

/// Field-scoped view over the store, the equivalent of a renderer's hook.
pub struct FieldHandle<'s> {
    store: &'s mut FormStore,
    schema: Option<&'s NormalizedSchema>,
    id: FieldId,
}

impl FieldHandle<'_> {
    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn state(&self) -> Option<&Value> {
        self.store.component(self.id.as_str())
    }

    pub fn variables(&self) -> &VariableBag {
        self.store.variables()
    }

    pub fn validation(&self) -> Option<&Validation> {
        self.store.validation(self.id.as_str())
    }

    /// Shallow-merge the update's result into this field's state.
    pub fn set_state(&mut self, update: impl FnOnce(Option<&Value>) -> Value + 'static) {
        self.store
            .dispatch(Action::update_field(self.id.clone(), update));
    }

    /// Replace this field's validation entry.
    pub fn set_validation(
        &mut self,
        update: impl FnOnce(Option<&Validation>) -> Validation + 'static,
    ) {
        self.store
            .dispatch(Action::update_validation(self.id.clone(), update));
    }

    /// Mutate the shared variables. Not scoped to this field.
    pub fn set_vars(&mut self, mutate: impl FnOnce(&VariableBag) -> VariableBag + 'static) {
        self.store.dispatch(Action::mutate_vars(mutate));
        if let Some(schema) = self.schema {
            self.store.mount_active(schema);
        }
    }
}
