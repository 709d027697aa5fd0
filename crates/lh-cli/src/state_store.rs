use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use lh_core::HostError;
use tracing::debug;

use crate::{
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, HostState, HOST_STATE_SCHEMA,
};

/// Writes `state` as pretty JSON. The payload lands in a sibling file first
/// and is renamed over `path`, so an interrupted write leaves the previous
/// state intact.
pub(crate) fn save_host_state(path: &Path, state: &HostState) -> Result<(), HostError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(map_cli_state_write(path))?;
    }

    let payload = serde_json::to_string_pretty(state).map_err(map_cli_state_write(path))?;
    let staging = path.with_extension("partial");
    fs::write(&staging, payload).map_err(map_cli_state_write(path))?;
    fs::rename(&staging, path).map_err(map_cli_state_write(path))?;

    debug!(
        target: "scripting",
        "Saved {} variable(s) of \"{}\" to {}",
        state.variables.len(),
        state.script,
        path.display()
    );
    Ok(())
}

/// Reads the state saved for `script`. A file written for another script
/// is rejected rather than restored into the wrong globals.
pub(crate) fn load_host_state(path: &Path, script: &str) -> Result<HostState, HostError> {
    if !path.is_file() {
        return Err(HostError::new(
            "CLI_STATE_NOT_FOUND",
            format!("No host state file at {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(map_cli_state_read(path))?;
    let state: HostState = serde_json::from_str(&raw).map_err(map_cli_state_invalid(path))?;

    if state.schema_version != HOST_STATE_SCHEMA {
        return Err(HostError::new(
            "CLI_STATE_SCHEMA",
            format!(
                "{} uses schema \"{}\", expected \"{}\"",
                path.display(),
                state.schema_version,
                HOST_STATE_SCHEMA
            ),
        ));
    }

    if state.script != script {
        return Err(HostError::new(
            "CLI_STATE_SCRIPT",
            format!(
                "{} holds state for \"{}\", not \"{}\"",
                path.display(),
                state.script,
                script
            ),
        ));
    }

    let duplicate = {
        let mut seen = BTreeSet::new();
        state
            .variables
            .iter()
            .find(|variable| !seen.insert(variable.name.as_str()))
            .map(|variable| variable.name.clone())
    };
    if let Some(duplicate) = duplicate {
        return Err(HostError::new(
            "CLI_STATE_INVALID",
            format!(
                "{} saves variable \"{}\" more than once",
                path.display(),
                duplicate
            ),
        ));
    }

    debug!(
        target: "scripting",
        "Loaded {} variable(s) saved for \"{}\"",
        state.variables.len(),
        state.script
    );
    Ok(state)
}
