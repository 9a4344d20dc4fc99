use crate::support::{print_json, session_or_exit, yes_no};
use serde_json::json;

pub fn run(schema: String, vars: Option<String>, config: Option<String>, json_output: bool) {
    let session = session_or_exit(&schema, vars.as_deref(), config.as_deref());
    let required = session.required();
    let missing = session.missing_required();

    if json_output {
        print_json(&json!({
            "requiredIds": required.required_ids,
            "variableToFields": required.variable_to_fields,
            "missing": missing,
            "valid": missing.is_empty(),
        }));
        return;
    }

    println!("formwork required {schema}");
    println!("  Required fields: {}", required.required_ids.len());
    for id in &required.required_ids {
        let state = if missing.contains(id) { "missing" } else { "ok" };
        println!("    - {id} ({state})");
    }
    println!("  Variables bound: {}", required.variable_to_fields.len());
    for (variable, ids) in &required.variable_to_fields {
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        println!("    - {variable}: {}", ids.join(", "));
    }
    println!("  Valid: {}", yes_no(missing.is_empty()));
}
