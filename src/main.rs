//! process-group-exporter - version 0.1.0
//!
//! Per-process-group CPU and memory exporter with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use clap::{Parser, ValueEnum};
use process_group_exporter::HealthStats;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_config, command_test};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{config_handler, health_handler, metrics_handler, root_handler};
use state::{build_collector, AppState};

/// Resolve effective log level (CLI > config > info).
fn resolve_log_level(config: &Config, args: &Args) -> LogLevel {
    if let Some(level) = &args.log_level {
        return level.clone();
    }
    config
        .log_level
        .as_deref()
        .and_then(|s| LogLevel::from_str(s, true).ok())
        .unwrap_or(LogLevel::Info)
}

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let level = resolve_log_level(config, args);
    let max_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(max_level) = max_level else {
        return Ok(());
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Logging initialized with level: {:?}", level);
    Ok(())
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), format.clone(), *commented),

            Commands::Test {
                iterations,
                verbose,
            } => {
                let config = load_validated_config(&args)?;
                setup_logging(&config, &args)?;
                command_test(*iterations, *verbose, &config)
            }

            Commands::Check => {
                let config = load_validated_config(&args)?;
                setup_logging(&config, &args)?;
                println!("🔍 Checking Runtime Requirements");
                println!("================================\n");

                match startup_checks::validate_requirements(&config) {
                    Ok(_) => {
                        println!("\n✅ All requirements met - ready for production!");
                        Ok(())
                    }
                    Err(e) => {
                        eprintln!("\n❌ Requirements check failed: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config, &args)?;

    info!("Starting process-group-exporter");

    if let Err(e) = startup_checks::validate_requirements(&config) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The exporter will start but scrapes may fail!");
    }

    // Configure parallel processing
    if let Some(threads) = config.parallelism {
        if threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .unwrap_or_else(|e| error!("Failed to set rayon thread pool: {}", e));
            debug!("Rayon thread pool configured with {} threads", threads);
        }
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;
    if !addr.ip().is_loopback() {
        warn!("⚠️  Binding to non-loopback address {} - metrics are reachable from the network", addr.ip());
    }

    let state = Arc::new(AppState {
        collector: build_collector(&config),
        collect_timeout: config.collect_timeout(),
        config: Arc::new(config.clone()),
        health_stats: Arc::new(HealthStats::new()),
    });

    // Configure HTTP server routes
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/config", get(config_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("process-group-exporter listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {}", e);
            e
        })?;

    info!("process-group-exporter stopped gracefully");
    Ok(())
}
