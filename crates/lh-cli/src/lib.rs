use std::ffi::OsString;

use clap::Parser;
use lh_core::HostError;

mod cli_args;
mod commands;
mod error_map;
mod frame_runner;
mod logging;
mod models;
mod source_loader;
mod state_store;

pub(crate) use cli_args::{CallArgs, CheckArgs, Cli, InspectArgs, Mode, RunArgs};
pub(crate) use commands::{cli_host_functions, run_call, run_check, run_inspect};
#[cfg(test)]
pub(crate) use commands::{check_scripts, parse_call_args};
pub(crate) use error_map::{
    emit_error, map_cli_arg_invalid, map_cli_source_read, map_cli_source_scan,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, map_cli_working_dir,
};
pub(crate) use frame_runner::run_run;
#[cfg(test)]
pub(crate) use frame_runner::{run_frames, FRAME_DELTA};
pub use logging::init_logging;
pub(crate) use models::{CheckEntry, CheckStatus, HostState, LoadedScript, HOST_STATE_SCHEMA};
pub(crate) use source_loader::{load_script, read_lua_scripts_from_dir, resolve_scripts_dir};
pub(crate) use state_store::{load_host_state, save_host_state};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, HostError> {
    match cli.command {
        Mode::Inspect(args) => run_inspect(args),
        Mode::Check(args) => run_check(args),
        Mode::Call(args) => run_call(args),
        Mode::Run(args) => run_run(args),
    }
}


#[cfg(test)]
mod tests;
