use std::process::ExitCode;

use clap::Parser;

use inkdesk::cli;

fn main() -> ExitCode {
    // Initialize session log (overwrites previous session log)
    inkdesk::logger::init();

    let args = cli::CliArgs::parse();
    cli::run(args)
}
