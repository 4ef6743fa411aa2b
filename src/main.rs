//! Predictor hub - main entry point
//!
//! Runs pre-trained models from the command line or as an HTTP service.

use clap::Parser;
use predictor_hub::cli::{
    cmd_batch, cmd_interactive, cmd_models, cmd_predict, cmd_schema, cmd_serve, resolve_models_dir, Cli,
    Commands,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "predictor_hub=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let models_dir = resolve_models_dir(cli.models_dir.as_deref());

    match cli.command {
        Some(Commands::Models) => {
            cmd_models(&models_dir)?;
        }
        Some(Commands::Schema { model }) => {
            cmd_schema(&model)?;
        }
        Some(Commands::Predict { model, set }) => {
            cmd_predict(&model, &set, &models_dir)?;
        }
        Some(Commands::Batch { model, data, output }) => {
            cmd_batch(&model, &data, output.as_deref(), &models_dir)?;
        }
        Some(Commands::Serve { port, host }) => {
            cmd_serve(&host, port, &models_dir).await?;
        }
        None => {
            cmd_interactive(&models_dir).await?;
        }
    }

    Ok(())
}
