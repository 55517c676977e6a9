use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rosarium::app::App;
use rosarium::autosave::SaveStatus;
use rosarium::cli::{Cli, Commands};
use rosarium::config::Config;
use rosarium::confirm::{AssumeYes, Confirm, StdinPrompt};
use rosarium::shell;
use rosarium::storage::FileStorage;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rosarium=warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().with_data_dir(cli.data_dir);

    let storage = match FileStorage::open(&config.data_dir) {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("Error opening data directory {}: {}", config.data_dir.display(), e);
            return Err(e.into());
        }
    };
    tracing::debug!(dir = %config.data_dir.display(), "using data directory");

    let confirmer: Box<dyn Confirm + Send> = if cli.yes { Box::new(AssumeYes) } else { Box::new(StdinPrompt) };
    let mut app = App::open(Arc::new(storage), config.autosave, confirmer);

    let result = match cli.command {
        Commands::Shell => shell::run(&mut app).await,
        command => app.execute(command).await,
    };
    if app.close().await == SaveStatus::Error {
        eprintln!("Error: changes could not be saved to {}", config.data_dir.display());
        eprintln!("If the saved data is damaged, `rosarium reset` deletes it and starts over.");
        return Err(anyhow!("save failed"));
    }
    result
}
