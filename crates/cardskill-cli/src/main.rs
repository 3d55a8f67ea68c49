use std::env;
use std::ffi::OsString;
use std::process;

use cardskill_cli::cli_args::Cli;
use cardskill_cli::{run, usage_error_json, wants_json};
use clap::Parser;

fn main() {
    let args: Vec<OsString> = env::args_os().collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() && wants_json(&args) => {
            println!("{}", usage_error_json(&err));
            process::exit(1);
        }
        Err(err) => err.exit(),
    };

    process::exit(run(cli));
}
