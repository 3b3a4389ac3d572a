use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_gate::clock::SystemClock;
use auth_gate::delivery::LogDelivery;
use auth_gate::{accounts, api, config::Config, expiration, roles::Role, storage::Store, AppState};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "auth-gate starting");

    // Load configuration
    let config = Config::load()?;

    if let Some(subject) = &config.auth_bypass_subject {
        warn!(
            subject = %subject,
            "AUTH_BYPASS_SUBJECT is set: ALL requests will authenticate as this account"
        );
    }

    // Open the embedded database
    let store = Store::open(&config.node.data_dir)?;
    info!("Database opened at: {}", config.node.data_dir);

    // Seed the initial super-admin if the directory has none
    let clock = Arc::new(SystemClock);
    match &config.bootstrap {
        Some(bootstrap) => {
            let created = accounts::ensure_bootstrap_admin(
                &store,
                chrono::Utc::now(),
                &bootstrap.email,
                &bootstrap.password,
            )?;
            if !created {
                info!("Super-admin already present, skipping bootstrap");
            }
        }
        None => {
            if store.count_role(Role::SuperAdmin)? == 0 {
                anyhow::bail!(
                    "no super-admin account exists and BOOTSTRAP_ADMIN_EMAIL/BOOTSTRAP_ADMIN_PASSWORD are not set"
                );
            }
        }
    }

    // Create shared state
    let state = Arc::new(AppState {
        clock,
        config: config.clone(),
        delivery: Arc::new(LogDelivery),
        store,
    });

    // Start background tasks
    let expiration_handle = expiration::start_expiration_cleaner(Arc::clone(&state));

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup: abort background tasks
    info!("Shutting down background tasks");
    expiration_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
