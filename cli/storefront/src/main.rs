use std::process::ExitCode;

use anyhow::{Context, Result};
use bpaf::{Args, Parser};
use commands::{StorefrontArgs, StorefrontCli};
use tracing::debug;
use utils::init::init_logger;
use utils::message;

use crate::utils::errors::format_error;

mod commands;
mod config;
mod utils;

async fn run(args: StorefrontArgs) -> Result<()> {
    init_logger(Some(args.verbosity));
    let config = config::Config::parse()?;
    args.handle(config).await?;
    Ok(())
}

fn main() -> ExitCode {
    // initialize logger with "best guess" defaults
    // updating the logger conf is cheap, so we reinitialize whenever we get more information
    init_logger(None);

    // Parse verbosity flags to affect help message/parse errors
    let verbosity = {
        let verbosity_parser = commands::verbosity();
        let other_parser = bpaf::any("_", Some::<String>).many();

        bpaf::construct!(verbosity_parser, other_parser)
            .map(|(v, _)| v)
            .to_options()
            .run_inner(Args::current_args())
            .unwrap_or_default()
    };

    init_logger(Some(verbosity));

    // Pass through Completion "failure"; In completion mode this needs to be printed as is
    // to work with the shell completion frontends
    //
    // Pass through Stdout failure; This represents `--help`
    let args = match commands::storefront_cli().run_inner(Args::current_args()) {
        Ok(StorefrontCli(args)) => args,
        Err(bpaf::ParseFailure::Stdout(m, _)) => {
            print!("{m:80}");
            return ExitCode::from(0);
        },
        Err(bpaf::ParseFailure::Stderr(m)) => {
            message::error(format!("{m:80}"));
            return ExitCode::from(1);
        },
        Err(bpaf::ParseFailure::Completion(c)) => {
            print!("{c}");
            return ExitCode::from(0);
        },
    };

    let runtime = match tokio::runtime::Runtime::new().context("Could not start async runtime") {
        Ok(runtime) => runtime,
        Err(e) => {
            message::error(format!("{e:#}"));
            return ExitCode::from(1);
        },
    };

    // Run storefront. Print errors and exit with status 1 on failure
    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::from(0),

        Err(e) => {
            debug!("{:#}", e);
            message::error(format_error(&e));
            ExitCode::from(1)
        },
    }
}
