use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "lh-cli")]
#[command(about = "Lua script host CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Inspect(InspectArgs),
    Check(CheckArgs),
    Call(CallArgs),
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub(crate) struct InspectArgs {
    #[arg(long = "script")]
    pub(crate) script: String,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
}

#[derive(Debug, Args)]
pub(crate) struct CallArgs {
    #[arg(long = "script")]
    pub(crate) script: String,
    #[arg(long = "function")]
    pub(crate) function: String,
    /// JSON value, repeat once per argument.
    #[arg(long = "arg")]
    pub(crate) args: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "script")]
    pub(crate) script: String,
    #[arg(long = "frames", default_value_t = 1)]
    pub(crate) frames: usize,
    #[arg(long = "editor")]
    pub(crate) editor: bool,
    /// Frame index after which the script is reloaded from disk.
    #[arg(long = "reload-at")]
    pub(crate) reload_at: Option<usize>,
    #[arg(long = "state-in")]
    pub(crate) state_in: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: Option<String>,
}
