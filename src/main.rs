use clap::Parser;
use mimalloc::MiMalloc;
use people_notebook::cli::{Cli, Command};
use people_notebook::config::{Config, Secret};
use people_notebook::lifecycle::Lifecycle;
use people_notebook::server::listener::shutdown_signal;
use people_notebook::service::{admin_ops, storage_init};
use people_notebook::startup;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing("info");
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&cfg.loglevel);

    cfg.log_effective();

    match cli.command.unwrap_or_default() {
        Command::Serve => serve(&cfg).await,
        Command::RotateAdminPassword { username, password } => {
            rotate(&cfg, &username, &password).await
        }
    }
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();
}

async fn serve(cfg: &Config) -> ExitCode {
    let lifecycle = Lifecycle::new();
    match startup::run(cfg, &lifecycle, shutdown_signal()).await {
        Ok(()) => {
            info!("shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => ExitCode::from(e.exit_code()),
    }
}

async fn rotate(cfg: &Config, username: &str, password: &Secret) -> ExitCode {
    let storage = match storage_init::initialize(cfg).await {
        Ok(storage) => storage,
        Err(e) => {
            error!(stage = e.stage(), error = %e, "storage initialization failed");
            return ExitCode::from(e.exit_code());
        }
    };

    let result = admin_ops::rotate_admin_password(&storage, username, password).await;
    storage.close().await;

    match result {
        Ok(admin) => {
            info!(username = %admin.username, "administrator password rotated");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(username, error = %e, "credential rotation failed");
            ExitCode::FAILURE
        }
    }
}
