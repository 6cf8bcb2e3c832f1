//! Missions CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use missions::auth::TokenManager;
use missions::cli::commands::MissionRunner;
use missions::cli::{Cli, Commands};
use missions::config::MissionsConfig;
use missions::executor::CommandExecutor;
use missions::remote::RemoteService;
use missions::storage::SecureStorage;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = MissionsConfig::from_env();
    let storage = Arc::new(SecureStorage::probe(&config));
    let tokens = TokenManager::new(storage);

    let result = match cli.command {
        Commands::Login => missions::cli::auth::handle_login(&config, tokens).await,
        Commands::Validate(args) => {
            let runner = mission_runner(&config, tokens);
            let mut stdin = std::io::stdin().lock();
            runner
                .validate(&args.id, &mut stdin, &mut std::io::stdout())
                .await
        }
        Commands::Submit(args) => {
            let runner = mission_runner(&config, tokens);
            let mut stdin = std::io::stdin().lock();
            runner
                .submit(&args.id, &mut stdin, &mut std::io::stdout())
                .await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn mission_runner(config: &MissionsConfig, tokens: TokenManager) -> MissionRunner {
    MissionRunner::new(
        RemoteService::new(config, tokens),
        CommandExecutor::new(config),
    )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
