//! The ambient, read-only context a form is rendered in.

use crate::vars::VariableBag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named booleans and strings describing the current cluster and project.
///
/// Resolvers receive it read-only; `injected_variables` exposes it to
/// `show_if` expressions through the shared variable environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FormContext {
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub namespace: Option<String>,
    pub project_id: Option<String>,
    pub is_cluster_scoped: bool,
    pub flags: BTreeMap<String, bool>,
}

impl FormContext {
    /// Variables seeded from the context when a store is created.
    pub fn injected_variables(&self) -> VariableBag {
        let mut vars = VariableBag::new();
        let strings = [
            ("currentCluster.name", &self.cluster_name),
            ("currentCluster.id", &self.cluster_id),
            ("namespace", &self.namespace),
            ("projectId", &self.project_id),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                vars.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        vars.insert(
            "isClusterScoped".to_string(),
            Value::Bool(self.is_cluster_scoped),
        );
        for (flag, enabled) in &self.flags {
            vars.insert(flag.clone(), Value::Bool(*enabled));
        }
        vars
    }
}
