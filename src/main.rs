mod cli;

use clipvault::{
    config,
    gateway::FfmpegGateway,
    lifecycle::AssetLifecycle,
    server::{self, AppContext},
    share::LinkManager,
    staging::Staging,
};
use clipvault_db::pool::init_pool;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting clipvault server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    std::fs::create_dir_all(&config.storage.data_dir)?;

    // Initialize database
    let db_path = config.storage.db_path();
    tracing::info!("Initializing database at {}", db_path.display());
    let db_pool = init_pool(&db_path.to_string_lossy())?;

    // Staging area for uploads and derived files
    let staging = Staging::new(config.storage.uploads_dir());
    staging.ensure_root().await?;

    let gateway = Arc::new(FfmpegGateway::new());
    let lifecycle = Arc::new(AssetLifecycle::new(db_pool.clone(), staging, gateway));
    let links = Arc::new(LinkManager::new(
        db_pool.clone(),
        config.server.resolved_base_url(),
    ));

    let ctx = AppContext {
        config: Arc::new(config),
        db_pool,
        lifecycle,
        links,
    };

    server::start_server(ctx).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipvault=trace,clipvault_db=debug,clipvault_av=debug,tower_http=debug".to_string()
        } else {
            "clipvault=debug,clipvault_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("clipvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = clipvault_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Base URL: {}", config.server.resolved_base_url());
            println!("  Auth enabled: {}", config.server.auth.enabled);
            println!("  Data dir: {}", config.storage.data_dir.display());
            println!("  Max upload size: {} bytes", config.limits.max_size_bytes);
            println!(
                "  Duration bounds: {}s to {}s",
                config.limits.min_duration_seconds, config.limits.max_duration_seconds
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
