use clap::Parser;
use std::process::ExitCode;

use lego::cli::{Cli, Command};
use lego::commands;
use lego::error::BuildError;
use lego::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let command = args.command.name();
    logging::init_subscriber(args.verbose, command);
    let log = Logger::new(command);

    let result = match &args.command {
        Command::Build(opts) => commands::build::run(&args.global, opts, &log),
    };

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<BuildError>() {
                Some(build_error) => log.error(&format!("build failed: {build_error}")),
                None => log.error(&format!("unexpected failure: {err:#}")),
            }
            ExitCode::FAILURE
        }
    };

    log.print_log_location();
    code
}
