use std::fmt::Display;
use std::path::Path;

use lh_core::HostError;

/// Prints the failure block of the stdout protocol and returns the exit code.
pub(crate) fn emit_error(error: HostError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", serde_json::Value::String(error.message));
    1
}

fn at_path<'a, E: Display>(
    code: &'static str,
    action: &'static str,
    path: &'a Path,
) -> impl FnOnce(E) -> HostError + 'a {
    move |error| {
        HostError::new(
            code,
            format!("Cannot {} {}: {}", action, path.display(), error),
        )
    }
}

pub(crate) fn map_cli_working_dir(error: std::io::Error) -> HostError {
    HostError::new(
        "CLI_SOURCE_PATH",
        format!("Cannot resolve the working directory: {}", error),
    )
}

pub(crate) fn map_cli_source_read(path: &Path) -> impl FnOnce(std::io::Error) -> HostError + '_ {
    at_path("CLI_SOURCE_READ", "read script", path)
}

pub(crate) fn map_cli_source_scan(
    root: &Path,
) -> impl FnOnce(std::path::StripPrefixError) -> HostError + '_ {
    at_path("CLI_SOURCE_SCAN", "scan scripts under", root)
}

/// `--arg` values are JSON; `position` is 1-based.
pub(crate) fn map_cli_arg_invalid(
    position: usize,
    raw: &str,
) -> impl FnOnce(serde_json::Error) -> HostError + '_ {
    move |error| {
        HostError::new(
            "CLI_ARG_INVALID",
            format!("Argument {} ({}) is not JSON: {}", position, raw, error),
        )
    }
}

pub(crate) fn map_cli_state_write<E: Display>(path: &Path) -> impl FnOnce(E) -> HostError + '_ {
    at_path("CLI_STATE_WRITE", "write host state", path)
}

pub(crate) fn map_cli_state_read(path: &Path) -> impl FnOnce(std::io::Error) -> HostError + '_ {
    at_path("CLI_STATE_READ", "read host state", path)
}

pub(crate) fn map_cli_state_invalid(
    path: &Path,
) -> impl FnOnce(serde_json::Error) -> HostError + '_ {
    at_path("CLI_STATE_INVALID", "parse host state", path)
}
