//! Key/value arrays, including the environment-variable flavour.
//!
//! A variable path with an `env` segment (`container.env.normal`) is
//! packaged for submission under the path without its `.normal` suffix:
//!
//! ```json
//! {"container.env": {
//!     "normal": {"PORT": 8080},
//!     "build": {...},
//!     "synced": [{"name": "shared", "version": 2,
//!                 "keys": [{"name": "DB_URL", "secret": true}]}]
//! }}
//! ```
//!
//! `build` is carried over from the revision value untouched.

use super::single;
use crate::context::FormContext;
use crate::field::FieldInit;
use crate::schema::Field;
use crate::vars::{VariableBag, as_text, parse_number};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Synced values containing this marker are secret references.
pub const SECRET_MARKER: &str = "PORTERSECRET";
const NORMAL_SUFFIX: &str = ".normal";
/// An object carrying any of these is a packaged env value, not a flat map.
const PACKAGED_KEYS: [&str; 3] = ["normal", "build", "synced"];

fn env_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\.)env(?:\.|$)").expect("env segment regex must compile"))
}

pub fn is_env_path(variable: &str) -> bool {
    env_segment_re().is_match(variable)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueEntry {
    pub key: String,
    pub value: String,
}

/// An environment group whose keys are synced into the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedEnvGroup {
    pub name: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl SyncedEnvGroup {
    /// `{name, version, keys: [{name, secret}]}`.
    fn to_submission(&self) -> Value {
        let keys: Vec<Value> = self
            .variables
            .iter()
            .map(|(name, value)| json!({"name": name, "secret": value.contains(SECRET_MARKER)}))
            .collect();
        json!({"name": self.name, "version": self.version, "keys": keys})
    }
}

fn entries_from(value: &Value) -> Vec<KeyValueEntry> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let key = item.get("key")?.as_str()?;
                let value = item.get("value").map(text_of).unwrap_or_default();
                Some(KeyValueEntry {
                    key: key.to_string(),
                    value,
                })
            })
            .collect(),
        Value::Object(map) if PACKAGED_KEYS.iter().any(|key| map.contains_key(*key)) => map
            .get("normal")
            .map(entries_from)
            .unwrap_or_default(),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| KeyValueEntry {
                key: key.clone(),
                value: text_of(value),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn text_of(value: &Value) -> String {
    as_text(value).unwrap_or_else(|| value.to_string())
}

/// Component state ▸ live variable ▸ revision ▸ default.
///
/// State only counts once a renderer has written `values`; registration
/// leaves it empty so edits made through the variables are not shadowed.
pub fn live_entries(
    field: &Field,
    variables: &VariableBag,
    state: Option<&Value>,
) -> Vec<KeyValueEntry> {
    let live = field
        .variable
        .as_deref()
        .and_then(|name| variables.get(name));
    state
        .and_then(|s| s.get("values"))
        .or(live)
        .or_else(|| field.revision_value())
        .or_else(|| field.default_value())
        .map(entries_from)
        .unwrap_or_default()
}

/// Synced groups from component state; `None` when the renderer has not
/// reported any, in which case the revision's `synced` list passes through.
pub fn live_synced(state: Option<&Value>) -> Option<Vec<SyncedEnvGroup>> {
    let raw = state?.get("synced_env_groups")?.clone();
    serde_json::from_value(raw).ok()
}

fn prior_synced(field: &Field) -> Vec<Value> {
    field
        .revision_value()
        .and_then(|prior| prior.get("synced"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Numbers are stored unquoted; everything else is newline-unescaped.
fn stored_value(text: &str) -> Value {
    match parse_number(text) {
        Some(number) => Value::Number(number),
        None => Value::String(unescape_newlines(text)),
    }
}

fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

fn packaged_key(variable: &str) -> &str {
    variable.strip_suffix(NORMAL_SUFFIX).unwrap_or(variable)
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
    let Some(variable) = field.variable.as_deref() else {
        return VariableBag::new();
    };

    let mut normal = Map::new();
    for entry in live_entries(field, variables, state) {
        if entry.key.trim().is_empty() {
            continue;
        }
        normal.insert(entry.key, stored_value(&entry.value));
    }

    if !is_env_path(variable) {
        return single(field, Some(Value::Object(normal)));
    }

    let mut packaged = Map::new();
    packaged.insert("normal".to_string(), Value::Object(normal));
    if let Some(build) = field
        .revision_value()
        .and_then(|prior| prior.get("build"))
        .filter(|b| !b.is_null())
    {
        packaged.insert("build".to_string(), build.clone());
    }
    let synced = match live_synced(state) {
        Some(groups) => groups.iter().map(SyncedEnvGroup::to_submission).collect(),
        None => prior_synced(field),
    };
    packaged.insert("synced".to_string(), Value::Array(synced));

    let mut bag = VariableBag::new();
    bag.insert(packaged_key(variable).to_string(), Value::Object(packaged));
    bag
}

/// Synced env-group diff between the revision and the live state:
/// `{"<key>": {"added": [...], "removed": [...]}}`.
pub fn metadata(
    _variables: &VariableBag,
    field: &Field,
    state: Option<&Value>,
    _context: &FormContext,
) -> VariableBag {
    let mut bag = VariableBag::new();
    let Some(variable) = field.variable.as_deref().filter(|v| is_env_path(v)) else {
        return bag;
    };

    let before: Vec<String> = prior_synced(field)
        .iter()
        .filter_map(|group| group.get("name").and_then(Value::as_str))
        .map(String::from)
        .collect();
    let after: Vec<String> = match live_synced(state) {
        Some(groups) => groups.into_iter().map(|g| g.name).collect(),
        None => before.clone(),
    };
    let added: Vec<&String> = after.iter().filter(|n| !before.contains(n)).collect();
    let removed: Vec<&String> = before.iter().filter(|n| !after.contains(n)).collect();

    bag.insert(
        packaged_key(variable).to_string(),
        json!({"added": added, "removed": removed}),
    );
    bag
}
