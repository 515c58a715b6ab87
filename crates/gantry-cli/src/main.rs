//! Gantry CLI entrypoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

use commands::{Commands, ConfigCommands};
use config::CliConfig;
use handlers::ResolveArgs;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about = "Gantry dependency revision resolver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load().unwrap_or_default();

    match cli.command {
        Commands::Validate { pipelines } => handlers::validate(&pipelines)?,
        Commands::Resolve {
            pipelines,
            history,
            pipeline,
            given,
            max_backtrack,
            batch_size,
            report,
            output,
        } => handlers::resolve(
            &config,
            ResolveArgs {
                pipelines,
                history,
                pipeline,
                given,
                max_backtrack,
                batch_size,
                report,
                output,
            },
        )?,
        Commands::Schema { target } => handlers::schema(target)?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(())
}
