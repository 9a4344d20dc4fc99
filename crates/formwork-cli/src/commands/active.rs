use crate::support::{print_json, session_or_exit};
use serde_json::json;

pub fn run(schema: String, vars: Option<String>, config: Option<String>, json_output: bool) {
    let session = session_or_exit(&schema, vars.as_deref(), config.as_deref());
    let normalized = session.schema();
    let active = session.active();

    let sections: Vec<_> = active
        .sections()
        .iter()
        .map(|&(tab, section)| {
            let tab = &normalized.tabs[tab];
            (tab.name.as_str(), tab.sections[section].name.as_str())
        })
        .collect();
    let field_ids: Vec<&str> = active.fields().map(|field| field.id.as_str()).collect();

    if json_output {
        let sections: Vec<_> = sections
            .iter()
            .map(|(tab, section)| json!({"tab": tab, "section": section}))
            .collect();
        print_json(&json!({
            "digest": session.store().digest().as_str(),
            "sections": sections,
            "fields": field_ids,
            "variables": session.store().variables(),
        }));
        return;
    }

    println!("formwork active {schema}");
    println!(
        "  Active sections: {} of {}",
        sections.len(),
        normalized.tabs.iter().map(|tab| tab.sections.len()).sum::<usize>()
    );
    for (tab, section) in &sections {
        println!("    - {tab} / {section}");
    }
    println!("  Active fields: {}", field_ids.len());
    for id in &field_ids {
        println!("    - {id}");
    }
}
