use super::*;
use crate::cli_test_support::*;
use lh_core::{EncodedVariable, ScriptValue};

use std::fs;
use std::path::{Path, PathBuf};

const COUNTER: &str = r#"
#Serialize ticks
ticks = 0
#Update
function update()
  ticks = ticks + 1
end
"#;

fn script_file(name: &str, source: &str) -> PathBuf {
    let path = temp_path(name).join(format!("{}.lua", name));
    write_file(&path, source);
    path
}

fn run_args(script: &Path, frames: usize) -> RunArgs {
    RunArgs {
        script: script.to_string_lossy().to_string(),
        frames,
        editor: false,
        reload_at: None,
        state_in: None,
        state_out: None,
    }
}

#[test]
fn run_frames_captures_serialized_variables_on_disable() {
    let script = script_file("counter", COUNTER);
    let report = run_frames(&run_args(&script, 3)).expect("run should pass");

    assert_eq!(report.script, "counter");
    assert_eq!(report.frames, 3);
    assert_eq!(
        report.variables,
        vec![EncodedVariable {
            name: "ticks".to_string(),
            type_descriptor: "lua.integer".to_string(),
            payload: "3".to_string(),
        }]
    );
}

#[test]
fn run_frames_keeps_state_across_reload() {
    let script = script_file("reloading", COUNTER);
    let mut args = run_args(&script, 4);
    args.reload_at = Some(1);

    let report = run_frames(&args).expect("run should pass");
    assert_eq!(report.reloads, 1);
    assert_eq!(report.variables[0].payload, "4");
}

#[test]
fn state_file_round_trip_resumes_counters() {
    let script = script_file("persisted", COUNTER);
    let state_path = temp_path("state").join("state.json");

    let mut first = run_args(&script, 2);
    first.state_out = Some(state_path.to_string_lossy().to_string());
    assert_eq!(run_run(first), Ok(0));

    let saved = load_host_state(&state_path, "persisted").expect("state should load");
    assert_eq!(saved.schema_version, HOST_STATE_SCHEMA);
    assert_eq!(saved.script, "persisted");

    let mut second = run_args(&script, 3);
    second.state_in = Some(state_path.to_string_lossy().to_string());
    let report = run_frames(&second).expect("resumed run should pass");
    assert_eq!(report.variables[0].payload, "5");
}

#[test]
fn load_host_state_rejects_missing_and_foreign_files() {
    let missing = temp_path("missing-state");
    let error = load_host_state(&missing, "door").expect_err("missing state");
    assert_eq!(error.code, "CLI_STATE_NOT_FOUND");

    let invalid = temp_path("invalid-state");
    write_file(&invalid, "{not json");
    let error = load_host_state(&invalid, "door").expect_err("invalid state");
    assert_eq!(error.code, "CLI_STATE_INVALID");
    assert!(error.message.contains("invalid-state"));

    let foreign = temp_path("foreign-state");
    write_file(
        &foreign,
        r#"{"schemaVersion":"lua-host-state.v0","script":"door","variables":[]}"#,
    );
    let error = load_host_state(&foreign, "door").expect_err("foreign schema");
    assert_eq!(error.code, "CLI_STATE_SCHEMA");
}

#[test]
fn load_host_state_rejects_state_saved_for_another_script() {
    let path = temp_path("other-script").join("state.json");
    save_host_state(&path, &HostState::new("door".to_string(), Vec::new())).expect("save");

    let error = load_host_state(&path, "slime").expect_err("different script");
    assert_eq!(error.code, "CLI_STATE_SCRIPT");
    assert!(error.message.contains("\"door\""));
    assert!(load_host_state(&path, "door").is_ok());
}

#[test]
fn load_host_state_rejects_duplicate_variables() {
    let path = temp_path("duplicate-state");
    let ticks = EncodedVariable {
        name: "ticks".to_string(),
        type_descriptor: "lua.integer".to_string(),
        payload: "1".to_string(),
    };
    save_host_state(
        &path,
        &HostState::new("door".to_string(), vec![ticks.clone(), ticks]),
    )
    .expect("save");

    let error = load_host_state(&path, "door").expect_err("duplicate variable");
    assert_eq!(error.code, "CLI_STATE_INVALID");
    assert!(error.message.contains("\"ticks\""));
}

#[test]
fn save_host_state_creates_parent_directories_and_replaces_atomically() {
    let path = temp_path("nested-state").join("a").join("b").join("state.json");
    let first = HostState::new("door".to_string(), Vec::new());
    save_host_state(&path, &first).expect("save should pass");
    assert_eq!(load_host_state(&path, "door").expect("load"), first);

    let second = HostState::new(
        "door".to_string(),
        vec![EncodedVariable {
            name: "open".to_string(),
            type_descriptor: "lua.boolean".to_string(),
            payload: "true".to_string(),
        }],
    );
    save_host_state(&path, &second).expect("overwrite should pass");
    assert_eq!(load_host_state(&path, "door").expect("reload"), second);
    assert!(!path.with_extension("partial").exists());
}

#[test]
fn check_scripts_reports_each_file() {
    let root = temp_path("check-dir");
    write_file(&root.join("good.lua"), "function ok() end\nfunction fine(a) end\n");
    write_file(&root.join("nested").join("bad.lua"), "function broken(\n");

    let entries = check_scripts(&CheckArgs {
        scripts_dir: root.to_string_lossy().to_string(),
    })
    .expect("check should scan");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].relative_path, "good.lua");
    assert_eq!(entries[0].status, CheckStatus::Ok { functions: 2 });
    assert_eq!(entries[1].relative_path, "nested/bad.lua");
    assert!(matches!(
        &entries[1].status,
        CheckStatus::Failed { code, .. } if code == "SCRIPT_COMPILE_ERROR"
    ));

    let root = root.to_string_lossy().to_string();
    let code = run_cli_from_args(["lh-cli", "check", "--scripts-dir", root.as_str()]);
    assert_eq!(code, 1);
}

#[test]
fn parse_call_args_reads_json_values() {
    let args = parse_call_args(&[
        "3".to_string(),
        "\"name\"".to_string(),
        "[1, 2]".to_string(),
    ])
    .expect("args should parse");
    assert_eq!(
        args,
        vec![
            ScriptValue::Integer(3),
            ScriptValue::String("name".to_string()),
            ScriptValue::Array(vec![ScriptValue::Integer(1), ScriptValue::Integer(2)]),
        ]
    );

    let error = parse_call_args(&["1".to_string(), "not json".to_string()])
        .expect_err("invalid arg");
    assert_eq!(error.code, "CLI_ARG_INVALID");
    assert!(error.message.starts_with("Argument 2"));
}

#[test]
fn run_cli_from_args_maps_outcomes_to_exit_codes() {
    let script = script_file("callable", "function add(a, b)\n  return a + b\nend\n");
    let script = script.to_string_lossy().to_string();
    let script = script.as_str();

    assert_eq!(
        run_cli_from_args([
            "lh-cli", "call", "--script", script, "--function", "add", "--arg", "2", "--arg", "5",
        ]),
        0
    );
    assert_eq!(
        run_cli_from_args(["lh-cli", "call", "--script", script, "--function", "add"]),
        1
    );
    assert_eq!(run_cli_from_args(["lh-cli", "inspect", "--script", script]), 0);
    assert_ne!(run_cli_from_args(["lh-cli", "unknown"]), 0);
}

#[test]
fn host_log_is_available_to_scripts() {
    let script = script_file(
        "logging",
        "#Start\nfunction start()\n  host_log('started', 1)\n  started = true\nend\n#Serialize started\n",
    );
    let report = run_frames(&run_args(&script, 0)).expect("run should pass");
    assert_eq!(report.variables[0].name, "started");
    assert_eq!(report.variables[0].payload, "true");
    assert_eq!(FRAME_DELTA.as_millis(), 16);
    fs::remove_file(&script).expect("cleanup");
}
