//! Schema normalization.
//!
//! `normalize` is a pure function of the raw document: identical input
//! always yields identical ids. A field's id is its position in the source
//! document, `variable` pseudo-fields included, even though those are
//! dropped from the output. Everything downstream (visibility, validation
//! keys, the submission fold) keys off these ids.

use crate::error::FormError;
use crate::schema::{
    Coordinates, Field, FieldId, FieldIndex, FieldKind, NormalizedSchema, Section, Tab,
};
use crate::show_if::ShowIf;
use crate::vars::VariableBag;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

const VARIABLE_TYPE: &str = "variable";

/// Fields the normalizer lifts out of the raw object; the rest lands in
/// `Field::extra`.
const LIFTED_KEYS: [&str; 7] = [
    "id", "type", "variable", "settings", "value", "required", "show_if",
];

/// A legacy type tag and the canonical shape it expands to.
struct Alias {
    canonical: &'static str,
    settings_type: &'static str,
    flags: &'static [&'static str],
}

fn legacy_alias(type_name: &str) -> Option<Alias> {
    let alias = match type_name {
        "number-input" => Alias {
            canonical: "input",
            settings_type: "number",
            flags: &[],
        },
        "string-input" => Alias {
            canonical: "input",
            settings_type: "string",
            flags: &[],
        },
        "string-input-password" => Alias {
            canonical: "input",
            settings_type: "password",
            flags: &[],
        },
        "env-key-value-array" => Alias {
            canonical: "key-value-array",
            settings_type: "env",
            flags: &["secretOption", "envLoader", "fileUpload"],
        },
        _ => return None,
    };
    Some(alias)
}

/// Rewrite a raw schema document into its canonical form.
///
/// Only document shape is checked here (objects and arrays where the
/// tabs → sections → contents layout expects them). Field kinds and
/// `show_if` shapes the engine does not understand pass through.
pub fn normalize(raw: &Value) -> Result<NormalizedSchema, FormError> {
    let root = raw
        .as_object()
        .ok_or_else(|| FormError::invalid_schema("$", "schema must be an object"))?;

    let mut schema = NormalizedSchema {
        name: string_at(root, "name"),
        has_source: bool_at(root, "hasSource"),
        include_hidden_fields: bool_at(root, "includeHiddenFields"),
        is_cluster_scoped: root.get("isClusterScoped").and_then(Value::as_bool),
        tabs: Vec::new(),
        fields: Vec::new(),
        coordinates: Vec::new(),
        index: BTreeMap::new(),
    };

    for (t, raw_tab) in array_at(root, "tabs", "$")?.iter().enumerate() {
        let tab_path = format!("$.tabs[{t}]");
        let tab = object(raw_tab, &tab_path)?;
        let name = string_at(tab, "name");
        let label = tab
            .get("label")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| name.clone());

        let mut sections = Vec::new();
        for (s, raw_section) in array_at(tab, "sections", &tab_path)?.iter().enumerate() {
            let section_path = format!("{tab_path}.sections[{s}]");
            let section = object(raw_section, &section_path)?;

            let mut members = Vec::new();
            for (f, raw_field) in array_at(section, "contents", &section_path)?
                .iter()
                .enumerate()
            {
                let field_path = format!("{section_path}.contents[{f}]");
                let field = object(raw_field, &field_path)?;
                let type_name = field
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        FormError::invalid_schema(&field_path, "field is missing `type`")
                    })?;
                if type_name == VARIABLE_TYPE {
                    continue;
                }

                let coordinates = Coordinates {
                    tab: t,
                    section: s,
                    field: f,
                };

                let normalized =
                    normalize_field(field, type_name, FieldId::from_coordinates(coordinates));
                if normalized.kind() == FieldKind::Unknown {
                    tracing::warn!(
                        id = %normalized.id,
                        field_type = %normalized.type_name,
                        "field type has no renderer"
                    );
                }
                let idx = FieldIndex(schema.fields.len());
                schema.index.insert(normalized.id.clone(), idx);
                schema.coordinates.push(coordinates);
                schema.fields.push(normalized);
                members.push(idx);
            }

            sections.push(Section {
                name: string_at(section, "name"),
                show_if: show_if_at(section),
                fields: members,
            });
        }

        schema.tabs.push(Tab {
            name,
            label,
            settings: tab.get("settings").filter(|v| !v.is_null()).cloned(),
            sections,
        });
    }

    tracing::debug!(
        name = %schema.name,
        tabs = schema.tabs.len(),
        fields = schema.fields.len(),
        "normalized schema"
    );
    Ok(schema)
}

fn normalize_field(raw: &Map<String, Value>, type_name: &str, id: FieldId) -> Field {
    let mut settings = raw
        .get("settings")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let mut extra: Map<String, Value> = raw
        .iter()
        .filter(|(key, _)| !LIFTED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let type_name = match legacy_alias(type_name) {
        Some(alias) => {
            let mut expanded = Map::new();
            expanded.insert("type".to_string(), json!(alias.settings_type));
            expanded.extend(settings);
            settings = expanded;
            for flag in alias.flags {
                extra.insert((*flag).to_string(), Value::Bool(true));
            }
            alias.canonical.to_string()
        }
        None => type_name.to_string(),
    };

    let value = match raw.get("value") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(scalar) => vec![scalar.clone()],
    };

    Field {
        id,
        type_name,
        variable: raw.get("variable").and_then(Value::as_str).map(String::from),
        settings,
        value,
        required: bool_at(raw, "required"),
        show_if: show_if_at(raw),
        extra,
    }
}

/// Initial variable values declared by `variable` pseudo-fields.
///
/// These fields never render; each contributes `settings.default` (or its
/// first revision value) under its `variable` key, later fields winning.
/// Malformed documents seed nothing.
pub fn seed_variables(raw: &Value) -> VariableBag {
    let mut seeded = VariableBag::new();
    let contents = raw
        .get("tabs")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|tab| tab.get("sections").and_then(Value::as_array))
        .flatten()
        .filter_map(|section| section.get("contents").and_then(Value::as_array))
        .flatten();

    for field in contents {
        if field.get("type").and_then(Value::as_str) != Some(VARIABLE_TYPE) {
            continue;
        }
        let Some(name) = field.get("variable").and_then(Value::as_str) else {
            continue;
        };
        let initial = field
            .get("settings")
            .and_then(|s| s.get("default"))
            .filter(|v| !v.is_null())
            .or_else(|| match field.get("value") {
                Some(Value::Array(items)) => items.first().filter(|v| !v.is_null()),
                Some(Value::Null) | None => None,
                Some(scalar) => Some(scalar),
            });
        if let Some(initial) = initial {
            seeded.insert(name.to_string(), initial.clone());
        }
    }
    seeded
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, FormError> {
    value
        .as_object()
        .ok_or_else(|| FormError::invalid_schema(path, "expected an object"))
}

fn array_at<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a [Value], FormError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(FormError::invalid_schema(
            format!("{path}.{key}"),
            "expected an array",
        )),
    }
}

fn string_at(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_at(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn show_if_at(map: &Map<String, Value>) -> Option<ShowIf> {
    map.get("show_if")
        .filter(|v| !v.is_null())
        .map(ShowIf::from_value)
}
