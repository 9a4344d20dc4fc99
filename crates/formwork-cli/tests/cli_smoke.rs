use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "formwork-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, name: &str, contents: &str) -> String {
        let path = self.path.join(name);
        fs::write(&path, contents).expect("fixture should be written");
        path.display().to_string()
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_formwork<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_formwork");
    Command::new(bin)
        .args(args)
        .output()
        .expect("formwork command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be valid json: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn web_schema() -> Value {
    json!({
        "name": "web",
        "tabs": [{"name": "main", "label": "Main", "sections": [
            {"name": "basics", "contents": [
                {"type": "string-input", "variable": "image", "required": true, "label": "Image"},
                {"type": "input", "variable": "memory", "settings": {"unit": "Mi"}},
                {"type": "number-input", "variable": "replicas"},
                {"type": "checkbox", "variable": "ingress.enabled", "settings": {"default": false}}
            ]},
            {"name": "ingress", "show_if": "ingress.enabled", "contents": [
                {"type": "input", "variable": "ingress.host", "required": true}
            ]}
        ]}]
    })
}

fn write_web_schema(tmp: &TempDirGuard) -> String {
    tmp.write("schema.json", &web_schema().to_string())
}

#[test]
fn normalize_json_assigns_ids_and_canonical_types() {
    let tmp = TempDirGuard::new("normalize");
    let schema = write_web_schema(&tmp);

    let output = run_formwork(["normalize", schema.as_str(), "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);

    assert!(
        payload["digest"]
            .as_str()
            .is_some_and(|d| d.starts_with("fs1_"))
    );
    let basics = &payload["schema"]["tabs"][0]["sections"][0]["contents"];
    assert_eq!(basics[0]["id"], json!("0-0-0"));
    assert_eq!(basics[0]["type"], json!("input"));
    assert_eq!(basics[0]["settings"]["type"], json!("string"));
    assert_eq!(basics[2]["settings"]["type"], json!("number"));
    assert_eq!(
        payload["schema"]["tabs"][0]["sections"][1]["contents"][0]["id"],
        json!("0-1-0")
    );
}

#[test]
fn normalize_reads_yaml_by_extension() {
    let tmp = TempDirGuard::new("yaml");
    let schema = tmp.write(
        "schema.yaml",
        "name: web\n\
         tabs:\n\
         \x20 - name: main\n\
         \x20   sections:\n\
         \x20     - name: basics\n\
         \x20       contents:\n\
         \x20         - type: string-input\n\
         \x20           variable: image\n",
    );

    let output = run_formwork(["normalize", schema.as_str(), "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    let field = &payload["schema"]["tabs"][0]["sections"][0]["contents"][0];
    assert_eq!(field["id"], json!("0-0-0"));
    assert_eq!(field["variable"], json!("image"));
}

#[test]
fn normalize_human_output_lists_fields() {
    let tmp = TempDirGuard::new("normalize-human");
    let schema = write_web_schema(&tmp);

    let output = run_formwork(["normalize", schema.as_str()]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("formwork normalize"));
    assert!(text.contains("Name: web"));
    assert!(text.contains("0-0-0 input -> image"));
}

#[test]
fn normalize_rejects_malformed_schema() {
    let tmp = TempDirGuard::new("malformed");
    let schema = tmp.write("schema.json", r#"{"name": "web", "tabs": {}}"#);

    let output = run_formwork(["normalize", schema.as_str()]);
    assert_failure(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid schema"));
}

#[test]
fn active_follows_vars_edits() {
    let tmp = TempDirGuard::new("active");
    let schema = write_web_schema(&tmp);

    let hidden = run_formwork(["active", schema.as_str(), "--json"]);
    assert_success(&hidden);
    let payload = parse_json_stdout(&hidden);
    assert_eq!(payload["sections"].as_array().map(Vec::len), Some(1));
    assert!(
        !payload["fields"]
            .as_array()
            .expect("fields array")
            .contains(&json!("0-1-0"))
    );

    let shown = run_formwork([
        "active",
        schema.as_str(),
        "--vars",
        r#"{"ingress.enabled": true}"#,
        "--json",
    ]);
    assert_success(&shown);
    let payload = parse_json_stdout(&shown);
    assert_eq!(payload["sections"][1]["section"], json!("ingress"));
    assert!(
        payload["fields"]
            .as_array()
            .expect("fields array")
            .contains(&json!("0-1-0"))
    );
}

#[test]
fn required_reports_missing_fields() {
    let tmp = TempDirGuard::new("required");
    let schema = write_web_schema(&tmp);

    let output = run_formwork(["required", schema.as_str(), "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["requiredIds"], json!(["0-0-0"]));
    assert_eq!(payload["missing"], json!(["0-0-0"]));
    assert_eq!(payload["valid"], json!(false));
    assert_eq!(payload["variableToFields"]["image"], json!(["0-0-0"]));
}

#[test]
fn resolve_fails_with_exit_two_when_required_missing() {
    let tmp = TempDirGuard::new("resolve-missing");
    let schema = write_web_schema(&tmp);

    let output = run_formwork(["resolve", schema.as_str(), "--json"]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing required fields"));
    assert!(stderr.contains("0-0-0"));
}

#[test]
fn resolve_applies_units_and_numbers() {
    let tmp = TempDirGuard::new("resolve");
    let schema = write_web_schema(&tmp);
    let vars = tmp.write(
        "vars.json",
        r#"{"image": "nginx:1.27", "memory": "256", "replicas": "3"}"#,
    );

    let output = run_formwork(["resolve", schema.as_str(), "--vars", vars.as_str(), "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["values"]["image"], json!("nginx:1.27"));
    assert_eq!(payload["values"]["memory"], json!("256Mi"));
    assert_eq!(payload["values"]["replicas"], json!(3));
    assert_eq!(payload["values"]["ingress.enabled"], json!(false));
    assert!(payload["values"].get("ingress.host").is_none());
    assert!(payload.get("metadata").is_none());
}

#[test]
fn resolve_honours_config_context_and_overrides() {
    let tmp = TempDirGuard::new("config");
    let schema = write_web_schema(&tmp);
    let config = tmp.write(
        "formwork.toml",
        "[context]\nnamespace = \"prod\"\n\n[overrides]\nimage = \"registry.local/web:pinned\"\n",
    );

    let output = run_formwork([
        "resolve",
        schema.as_str(),
        "--vars",
        r#"{"image": "nginx"}"#,
        "--config",
        config.as_str(),
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["values"]["image"], json!("registry.local/web:pinned"));
    assert_eq!(payload["values"]["namespace"], json!("prod"));
}

#[test]
fn vars_must_be_an_object() {
    let tmp = TempDirGuard::new("bad-vars");
    let schema = write_web_schema(&tmp);
    let vars = tmp.write("vars.json", "[1, 2]");
    assert!(tmp.path().join("vars.json").exists());

    let output = run_formwork(["active", schema.as_str(), "--vars", vars.as_str()]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("vars must be a JSON object"));
}

#[test]
fn resolve_replays_vars_into_list_and_map_fields() {
    let tmp = TempDirGuard::new("lists");
    let schema = tmp.write(
        "schema.json",
        &json!({"name": "web", "tabs": [{"name": "main", "sections": [{"name": "s", "contents": [
            {"type": "array-input", "variable": "hosts"},
            {"type": "key-value-array", "variable": "ingress.annotations"}
        ]}]}]})
        .to_string(),
    );

    let output = run_formwork([
        "resolve",
        schema.as_str(),
        "--vars",
        r#"{"hosts": ["a.com"], "ingress.annotations": {"tls": "on"}}"#,
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["values"]["hosts"], json!(["a.com"]));
    assert_eq!(payload["values"]["ingress.annotations"], json!({"tls": "on"}));
}
