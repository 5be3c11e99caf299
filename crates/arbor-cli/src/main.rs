//! Arbor - component server with filesystem routing and hot reload.
//!
//! Entry point: parses arguments, initializes logging, and runs the server.

use arbor_cli::{cli, config, logger, server, ui};
use clap::Parser;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = cli::Cli::parse();

    // production servers default to errors only; -v still wins
    let production = match &args.command {
        cli::Command::Serve(serve_args) => serve_args.production,
    };
    logger::init_logger(args.verbose, args.quiet || production);

    let result = match args.command {
        cli::Command::Serve(serve_args) => run(serve_args).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err}"));
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::ServeArgs) -> Result<(), arbor_cli::error::CliError> {
    let config = config::ServerConfig::from_args(&args)?;
    config.validate()?;
    server::serve(config).await
}
