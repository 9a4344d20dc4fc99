use crate::support::{emit_error, print_json, read_schema_or_exit};
use formwork_engine::{normalize, schema_digest};
use serde_json::json;

pub fn run(schema: String, json_output: bool) {
    let raw = read_schema_or_exit(&schema);
    let normalized = normalize(&raw).unwrap_or_else(|e| emit_error(e));
    let digest = schema_digest(&raw);

    if json_output {
        print_json(&json!({
            "digest": digest.as_str(),
            "schema": normalized,
        }));
        return;
    }

    println!("formwork normalize {schema}");
    println!("  Name: {}", normalized.name);
    println!("  Digest: {digest}");
    println!("  Fields: {}", normalized.fields().len());
    for tab in &normalized.tabs {
        println!("  Tab {}", tab.name);
        for section in &tab.sections {
            println!("    Section {}", section.name);
            for idx in &section.fields {
                let field = normalized.field(*idx);
                match &field.variable {
                    Some(variable) => {
                        println!("      - {} {} -> {variable}", field.id, field.type_name)
                    }
                    None => println!("      - {} {}", field.id, field.type_name),
                }
            }
        }
    }
}
