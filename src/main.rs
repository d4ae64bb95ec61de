use clap::Parser;
use form_assist::cli::commands::{cmd_discover, cmd_serve};
use form_assist::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries protocol output; logs go to stderr.
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("form_assist={}", level))),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Discover { page } => cmd_discover(&page, &config)?,
        Commands::Serve {
            page,
            endpoint,
            canned,
            drift_policy,
        } => cmd_serve(
            &page,
            endpoint.as_deref(),
            canned.as_deref(),
            drift_policy.as_deref(),
            &config,
        )?,
    }

    Ok(())
}
