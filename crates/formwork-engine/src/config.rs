//! Engine configuration loaded from TOML.
//!
//! ```toml
//! include_metadata = true
//!
//! [context]
//! cluster_name = "prod"
//! namespace = "web"
//!
//! [context.flags]
//! previewEnvironments = true
//!
//! [overrides]
//! "ingress.enabled" = true
//! ```

use crate::context::FormContext;
use crate::error::FormError;
use crate::vars::VariableBag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub context: FormContext,
    /// Variables that win over every field write.
    pub overrides: BTreeMap<String, toml::Value>,
    /// Run the metadata resolution pass on submit.
    pub include_metadata: bool,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, FormError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overrides converted into the JSON variable space.
    pub fn override_variables(&self) -> Result<VariableBag, FormError> {
        let mut vars = VariableBag::new();
        for (key, value) in &self.overrides {
            vars.insert(key.clone(), serde_json::to_value(value)?);
        }
        Ok(vars)
    }
}
