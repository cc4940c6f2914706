use clap::Parser;
use param_cleaner::{
    cli::{Cli, Commands},
    commands,
    config::Config,
    logging::init_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_logging(&config.app_env);

    let command = cli.command.unwrap_or(Commands::Serve);
    if let Err(e) = commands::run(command, config).await {
        tracing::error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
