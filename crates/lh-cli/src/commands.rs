use std::sync::Arc;

use lh_core::{HostError, ScriptValue};
use lh_parser::{exposed_variables, serialized_variables};
use lh_runtime::{HostFunctionRegistry, HostFunctions, ScriptInstance, ScriptInstanceOptions};
use tracing::info;

use crate::{
    load_script, map_cli_arg_invalid, read_lua_scripts_from_dir, resolve_scripts_dir, CallArgs,
    CheckArgs, CheckEntry, CheckStatus, InspectArgs, LoadedScript,
};

/// Functions every script run through the CLI can call.
pub(crate) fn cli_host_functions() -> Arc<dyn HostFunctionRegistry> {
    let mut functions = HostFunctions::new();
    functions.register("host_log", |args| {
        let message = args
            .iter()
            .map(|arg| match arg {
                ScriptValue::String(text) => text.clone(),
                other => other.to_json().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        info!(target: "scripting", "{}", message);
        Ok(ScriptValue::Nil)
    });
    functions.into_registry()
}

fn build_instance(script: &LoadedScript) -> Result<ScriptInstance, HostError> {
    ScriptInstance::with_options(ScriptInstanceOptions {
        name: script.name.clone(),
        source: script.source.clone(),
        host_functions: Some(cli_host_functions()),
    })
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn run_inspect(args: InspectArgs) -> Result<i32, HostError> {
    let script = load_script(&args.script)?;
    let instance = build_instance(&script)?;

    println!("RESULT:OK");
    println!("SCRIPT:{}", instance.name());
    for declaration in instance.declarations() {
        if instance
            .try_get_function(&declaration.name, declaration.arity)
            .is_none()
        {
            continue;
        }
        println!(
            "FUNCTION:{}|{}|{}",
            declaration.name,
            declaration.arity,
            serde_json::to_string(&instance.tags_of(&declaration.name))
                .unwrap_or_else(|_| "[]".to_string())
        );
    }
    for tag in instance.tags() {
        println!("TAG_JSON:{}", json_string(tag));
    }
    for name in serialized_variables(instance.tags()) {
        println!("SERIALIZE:{}", name);
    }
    for variable in exposed_variables(instance.tags()) {
        println!("EXPOSED:{}|{}", variable.type_name, variable.name);
    }
    Ok(0)
}

pub(crate) fn check_scripts(args: &CheckArgs) -> Result<Vec<CheckEntry>, HostError> {
    let root = resolve_scripts_dir(&args.scripts_dir)?;
    let scripts = read_lua_scripts_from_dir(&root)?;

    Ok(scripts
        .into_iter()
        .map(|(relative_path, source)| {
            let name = relative_path.trim_end_matches(".lua").to_string();
            let status = match ScriptInstance::with_options(ScriptInstanceOptions {
                name,
                source,
                host_functions: Some(cli_host_functions()),
            }) {
                Ok(instance) => CheckStatus::Ok {
                    functions: instance.function_names().len(),
                },
                Err(error) => CheckStatus::Failed {
                    code: error.code,
                    message: error.message,
                },
            };
            CheckEntry {
                relative_path,
                status,
            }
        })
        .collect())
}

pub(crate) fn run_check(args: CheckArgs) -> Result<i32, HostError> {
    let entries = check_scripts(&args)?;
    let failed = entries
        .iter()
        .filter(|entry| matches!(entry.status, CheckStatus::Failed { .. }))
        .count();

    if failed == 0 {
        println!("RESULT:OK");
    }
    for entry in &entries {
        match &entry.status {
            CheckStatus::Ok { functions } => {
                println!("SCRIPT_OK:{}|{}", entry.relative_path, functions)
            }
            CheckStatus::Failed { code, message } => println!(
                "SCRIPT_ERROR:{}|{}|{}",
                entry.relative_path,
                code,
                json_string(message)
            ),
        }
    }

    if failed > 0 {
        return Err(HostError::new(
            "CLI_CHECK_FAILED",
            format!("{} of {} script(s) failed to load.", failed, entries.len()),
        ));
    }
    Ok(0)
}

pub(crate) fn parse_call_args(raw: &[String]) -> Result<Vec<ScriptValue>, HostError> {
    raw.iter()
        .enumerate()
        .map(|(index, arg)| {
            serde_json::from_str::<serde_json::Value>(arg)
                .map(ScriptValue::from_json)
                .map_err(map_cli_arg_invalid(index + 1, arg))
        })
        .collect()
}

pub(crate) fn run_call(args: CallArgs) -> Result<i32, HostError> {
    let script = load_script(&args.script)?;
    let call_args = parse_call_args(&args.args)?;
    let instance = build_instance(&script)?;
    let value = instance.call(&args.function, &call_args)?;

    println!("RESULT:OK");
    println!("VALUE_JSON:{}", value.to_json());
    Ok(0)
}
