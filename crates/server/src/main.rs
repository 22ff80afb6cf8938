use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nics_processors_core::{
    load_config, validate_config, EmApi, EmApiClient, EmailDispatcher, IncidentOrgProvisioner,
    Mailer, OrgCache, SmtpMailer,
};
use nics_processors_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("NICS_PROC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Email dispatcher, if SMTP is configured
    let dispatcher = match &config.smtp {
        Some(smtp_config) => {
            info!(
                "Initializing SMTP mailer at {}:{}",
                smtp_config.host, smtp_config.port
            );
            let mailer: Arc<dyn Mailer> =
                Arc::new(SmtpMailer::new(smtp_config).context("Failed to create SMTP mailer")?);
            Some(Arc::new(EmailDispatcher::new(mailer)))
        }
        None => {
            info!("No SMTP configured, email dispatcher disabled");
            None
        }
    };

    // Room provisioner, if configured. Bootstrap failures are fatal.
    let provisioner = match &config.provisioner {
        Some(provisioner_config) => {
            info!("Initializing em-api client at {}", provisioner_config.emapi.url);
            let api: Arc<dyn EmApi> = Arc::new(
                EmApiClient::new(&provisioner_config.emapi)
                    .context("Failed to create em-api client")?,
            );
            let orgs = Arc::new(OrgCache::new());
            let provisioner = IncidentOrgProvisioner::bootstrap(provisioner_config, api, orgs)
                .await
                .context("Failed to bootstrap room provisioner")?;
            info!(
                "Room provisioner ready (identity userorg {})",
                provisioner.identity_userorg_id()
            );
            Some(Arc::new(provisioner))
        }
        None => {
            info!("No provisioner configured, room provisioning disabled");
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), provisioner, dispatcher));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
