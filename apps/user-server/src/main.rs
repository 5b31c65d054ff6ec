use anyhow::{Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use db::DbHandle;
use mimalloc::MiMalloc;
use runtime::config::default_logging_config;
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use users::api::rest::{openapi::UsersApi, routes::register_routes};
use users::{bootstrap_schema, SeaOrmUsersRepository, Service};
use utoipa::OpenApi;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// User Server - CRUD HTTP API for user records
#[derive(Parser)]
#[command(name = "user-server")]
#[command(about = "User Server - CRUD HTTP API for user records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL (overrides config)
    #[arg(long)]
    database_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database with the users table created
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        database_url: cli.database_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(default_logging_config);
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("User Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args.mock).await,
        Commands::Check => check_config(config),
    }
}

/// Ingress settings from the modules bag, with the server section filling
/// in the bind address and request deadline.
fn ingress_config(config: &AppConfig) -> Result<(ApiIngressConfig, String)> {
    let mut ingress: ApiIngressConfig = config.module_config("api_ingress")?;
    if config.server.timeout_sec > 0 {
        ingress.request_timeout = Duration::from_secs(config.server.timeout_sec);
    }
    let bind_addr = ingress
        .bind_addr
        .clone()
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));
    Ok((ingress, bind_addr))
}

async fn run_server(config: AppConfig, mock: bool) -> Result<()> {
    let (ingress_cfg, bind_addr) = ingress_config(&config)?;
    let ingress = ApiIngress::new(ingress_cfg).with_openapi(&UsersApi::openapi())?;

    let db = DbHandle::connect(&config.database_url(), config.database.connect_opts())
        .await
        .context("Failed to connect to database")?;
    tracing::info!(engine = ?db.engine(), dsn = %db.dsn(), "Connected to database");

    if mock {
        bootstrap_schema(db.seaorm())
            .await
            .context("Failed to create users table")?;
        tracing::info!("Mock database ready");
    }

    let repo = Arc::new(SeaOrmUsersRepository::new(db.sea()));
    let service = Arc::new(Service::new(repo));
    let router = ingress.build_router(register_routes(Router::new(), service));

    let served = ingress
        .serve(&bind_addr, router, runtime::shutdown_token())
        .await;
    db.close().await;
    served
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let (_, bind_addr) = ingress_config(&config)?;
    bind_addr
        .parse::<std::net::SocketAddr>()
        .with_context(|| format!("Invalid bind address '{bind_addr}'"))?;
    DbHandle::detect(&config.database_url())?;

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
