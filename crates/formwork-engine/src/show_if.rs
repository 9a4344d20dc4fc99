//! Visibility expressions.
//!
//! A `show_if` is a small boolean tree evaluated against the variable
//! environment. Shapes are recognized in a fixed priority order:
//!
//! 1. a bare string: truthy lookup of that variable
//! 2. `{is, variable}`: equality of the variable against `is`
//! 3. `{or: [...]}`: any child holds (`false` when empty)
//! 4. `{and: [...]}`: every child holds (`true` when empty)
//! 5. `{not: expr}`: negation
//!
//! Anything else is kept as [`ShowIf::Unrecognized`] and evaluates to
//! `false`, so a malformed expression hides its section instead of failing.

use crate::vars::{VariableBag, is_truthy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ShowIf {
    Variable(String),
    Is { variable: String, is: Value },
    Or(Vec<ShowIf>),
    And(Vec<ShowIf>),
    Not(Box<ShowIf>),
    Unrecognized(Value),
}

impl ShowIf {
    /// Classify a raw JSON expression.
    pub fn from_value(raw: &Value) -> Self {
        match raw {
            Value::String(name) => ShowIf::Variable(name.clone()),
            Value::Object(map) => Self::from_object(map).unwrap_or_else(|| {
                tracing::warn!(expr = %raw, "unrecognized show_if shape");
                ShowIf::Unrecognized(raw.clone())
            }),
            other => {
                tracing::warn!(expr = %other, "unrecognized show_if shape");
                ShowIf::Unrecognized(other.clone())
            }
        }
    }

    fn from_object(map: &Map<String, Value>) -> Option<Self> {
        if let (Some(is), Some(Value::String(variable))) = (map.get("is"), map.get("variable")) {
            return Some(ShowIf::Is {
                variable: variable.clone(),
                is: is.clone(),
            });
        }
        if let Some(Value::Array(children)) = map.get("or") {
            return Some(ShowIf::Or(children.iter().map(Self::from_value).collect()));
        }
        if let Some(Value::Array(children)) = map.get("and") {
            return Some(ShowIf::And(children.iter().map(Self::from_value).collect()));
        }
        map.get("not")
            .map(|inner| ShowIf::Not(Box::new(Self::from_value(inner))))
    }

    /// Evaluate against the variable environment. Pure and total.
    pub fn eval(&self, variables: &VariableBag) -> bool {
        match self {
            ShowIf::Variable(name) => is_truthy(variables.get(name)),
            ShowIf::Is { variable, is } => variables.get(variable) == Some(is),
            ShowIf::Or(children) => children.iter().any(|c| c.eval(variables)),
            ShowIf::And(children) => children.iter().all(|c| c.eval(variables)),
            ShowIf::Not(inner) => !inner.eval(variables),
            ShowIf::Unrecognized(_) => false,
        }
    }

    /// Every variable name the expression reads, in first-seen order.
    pub fn referenced_variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ShowIf::Variable(name) | ShowIf::Is { variable: name, .. } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            ShowIf::Or(children) | ShowIf::And(children) => {
                for child in children {
                    child.collect_variables(out);
                }
            }
            ShowIf::Not(inner) => inner.collect_variables(out),
            ShowIf::Unrecognized(_) => {}
        }
    }
}

impl From<Value> for ShowIf {
    fn from(raw: Value) -> Self {
        ShowIf::from_value(&raw)
    }
}

impl From<ShowIf> for Value {
    fn from(expr: ShowIf) -> Self {
        match expr {
            ShowIf::Variable(name) => Value::String(name),
            ShowIf::Is { variable, is } => {
                let mut map = Map::new();
                map.insert("is".to_string(), is);
                map.insert("variable".to_string(), Value::String(variable));
                Value::Object(map)
            }
            ShowIf::Or(children) => single_key("or", children),
            ShowIf::And(children) => single_key("and", children),
            ShowIf::Not(inner) => {
                let mut map = Map::new();
                map.insert("not".to_string(), Value::from(*inner));
                Value::Object(map)
            }
            ShowIf::Unrecognized(raw) => raw,
        }
    }
}

fn single_key(key: &str, children: Vec<ShowIf>) -> Value {
    let mut map = Map::new();
    map.insert(
        key.to_string(),
        Value::Array(children.into_iter().map(Value::from).collect()),
    );
    Value::Object(map)
}

/// Evaluate an optional expression.
///
/// A missing expression is `false` in isolation. Callers that gate
/// visibility treat "no `show_if`" as shown before reaching this.
pub fn eval_show_if(expr: Option<&ShowIf>, variables: &VariableBag) -> bool {
    expr.is_some_and(|e| e.eval(variables))
}

/// `!show_if || eval_show_if(show_if)`: the visibility rule for sections.
pub fn is_shown(expr: Option<&ShowIf>, variables: &VariableBag) -> bool {
    expr.is_none() || eval_show_if(expr, variables)
}
