use std::process::ExitCode;

use clap::Parser;
use vatbook_cli::Cli;
use vatbook_core::config::{AppConfig, LogFormat};

fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow::anyhow!("failed to install log subscriber: {error}"))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    // Commands report config failures themselves; logging just stays off.
    if let Ok(config) = AppConfig::load(cli.load_options()) {
        init_logging(&config)?;
    }

    Ok(vatbook_cli::run(cli))
}
