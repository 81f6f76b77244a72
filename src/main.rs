//! Occustress - Main Entry Point

use clap::Parser;
use occustress::cli::{
    cmd_analyze, cmd_importance, cmd_info, cmd_predict, cmd_train, load_config, Cli, Commands,
};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "occustress=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Train { data, model_dir, seed }) => {
            cmd_train(config, data, model_dir, seed)?;
        }
        Some(Commands::Predict { input, answers, json }) => {
            cmd_predict(config, input.as_deref(), &answers, json)?;
        }
        Some(Commands::Importance { top }) => {
            cmd_importance(config, top)?;
        }
        Some(Commands::Analyze { data, group_by, metric }) => {
            cmd_analyze(config, data, &group_by, &metric)?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(config, data)?;
        }
        None => {
            // Default: overview of the configured dataset
            cmd_analyze(config, None, "income", "weekly_hours")?;
        }
    }

    Ok(())
}
