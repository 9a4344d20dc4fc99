use formwork_engine::vars::is_present;
use formwork_engine::{Action, EngineConfig, FormSession, VariableBag};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub fn emit_error(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

/// Read a schema document. `.yaml`/`.yml` parse as YAML, anything else as JSON.
pub fn read_schema_or_exit(path: &str) -> Value {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        emit_error(format!("failed to read schema at {path}: {e}"));
    });
    let is_yaml = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yaml_ng::from_str::<Value>(&text).unwrap_or_else(|e| {
            emit_error(format!("failed to parse schema YAML at {path}: {e}"));
        })
    } else {
        serde_json::from_str::<Value>(&text).unwrap_or_else(|e| {
            emit_error(format!("failed to parse schema JSON at {path}: {e}"));
        })
    }
}

pub fn read_config_or_exit(path: Option<&str>) -> EngineConfig {
    let Some(path) = path else {
        return EngineConfig::default();
    };
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        emit_error(format!("failed to read config at {path}: {e}"));
    });
    EngineConfig::from_toml_str(&text).unwrap_or_else(|e| emit_error(e))
}

/// `--vars` is either an inline JSON object or a path to one.
pub fn read_vars_or_exit(arg: Option<&str>) -> VariableBag {
    let Some(arg) = arg else {
        return VariableBag::new();
    };
    let text = if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        fs::read_to_string(arg).unwrap_or_else(|e| {
            emit_error(format!("failed to read vars at {arg}: {e}"));
        })
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        Ok(_) => emit_error("vars must be a JSON object"),
        Err(e) => emit_error(format!("failed to parse vars JSON: {e}")),
    }
}

/// Build a session and replay `vars` as a user edit: one `mutate-vars`
/// for the bag, then a validation update for every mounted field bound to
/// an edited variable.
pub fn session_or_exit(schema: &str, vars: Option<&str>, config: Option<&str>) -> FormSession {
    let raw = read_schema_or_exit(schema);
    let config = read_config_or_exit(config);
    let edits = read_vars_or_exit(vars);
    let mut session = FormSession::new(&raw, &config).unwrap_or_else(|e| emit_error(e));
    if edits.is_empty() {
        return session;
    }

    let patch = edits.clone();
    session.dispatch(Action::mutate_vars(move |_| patch));

    let touched: Vec<_> = session
        .schema()
        .fields()
        .iter()
        .filter(|field| session.store().is_registered(field.id.as_str()))
        .filter_map(|field| {
            let name = field.variable.as_deref()?;
            edits
                .contains_key(name)
                .then(|| (field.id.clone(), is_present(edits.get(name))))
        })
        .collect();
    tracing::debug!(edited = edits.len(), fields = touched.len(), "replaying vars");
    for (id, present) in touched {
        session.dispatch(Action::update_validation(id, move |prior| {
            let mut next = prior.cloned().unwrap_or_default();
            next.validated = present;
            next
        }));
    }
    session
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    let rendered = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| emit_error(format!("failed to render json: {e}")));
    println!("{rendered}");
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
