use crate::support::{print_json, session_or_exit};
use formwork_engine::{FormError, Submission};

fn emit_missing(err: FormError) -> ! {
    eprintln!("{err}");
    if let FormError::MissingRequiredFields { missing } = &err {
        for id in missing {
            eprintln!("  - {id}");
        }
    }
    std::process::exit(2);
}

pub fn run(schema: String, vars: Option<String>, config: Option<String>, json_output: bool) {
    let session = session_or_exit(&schema, vars.as_deref(), config.as_deref());

    let mut submitted: Option<Submission> = None;
    if let Err(err) = session.submit(|submission| submitted = Some(submission)) {
        emit_missing(err);
    }
    let Some(submission) = submitted else {
        return;
    };

    if json_output {
        print_json(&submission);
        return;
    }

    println!("formwork resolve {schema}");
    println!("  Values: {}", submission.values.len());
    for (name, value) in &submission.values {
        println!("    {name} = {value}");
    }
    if let Some(metadata) = &submission.metadata {
        println!("  Metadata: {}", metadata.len());
        for (name, value) in metadata {
            println!("    {name} = {value}");
        }
    }
}
