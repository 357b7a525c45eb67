//! Forge CLI - command-line front end for the extraction pipeline.

use clap::Parser;
use forge_cli::{commands, Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> forge_cli::Result<()> {
    let cli = Cli::parse();

    // Load or create config
    let config = Config::load().unwrap_or_else(|_| {
        let cfg = Config::default();
        cfg.save().ok();
        cfg
    });

    let format = cli.format.map(Into::into).unwrap_or(config.format);
    let color_enabled = !cli.no_color && config.color;
    let formatter = Formatter::new(format, color_enabled);

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, &db_path, &formatter).await?;
        }
        Command::List(args) => {
            commands::execute_list(args, &db_path, &formatter)?;
        }
    }

    Ok(())
}
