//! actionkit CLI main entry point

use actionkit_cli::{
    cli::{Cli, Commands},
    commands::{CheckCommand, ExecuteArgs, ExecuteCommand, ListCommand},
    error::CliResult,
    utils::{init_tracing, ColoredOutput},
};
use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", ColoredOutput::error("Error:"), e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    debug!("actionkit CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Execute { action, params, params_file, user, jwt, lang, pretty } => {
            let args = ExecuteArgs { action, params, params_file, user, jwt, lang, pretty };
            ExecuteCommand::run(&cli.config, args).await
        }
        Commands::List { format } => ListCommand::run(&cli.config, format),
        Commands::Check => CheckCommand::run(&cli.config).await,
    }
}
