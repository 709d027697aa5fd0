fn main() {
    lh_cli::init_logging();
    std::process::exit(lh_cli::run_cli_from_args(std::env::args_os()));
}
