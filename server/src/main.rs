use algovault_server::auth::token::TokenSigner;
use algovault_server::auth::AuthGuard;
use algovault_server::config::Config;
use algovault_server::readiness::ReadinessGate;
use algovault_server::service::{initialize_in_background, CatalogService, ServiceSettings};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with span durations
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(port = config.port, "Starting AlgoVault server");
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set, signing tokens with the development secret");
    }

    let gate = ReadinessGate::new();
    let guard = AuthGuard::new(
        TokenSigner::new(config.jwt_secret(), config.token_ttl()),
        config.fallback_role(),
    );
    let service = CatalogService::new(
        gate.clone(),
        guard,
        ServiceSettings {
            allow_registration: config.allow_registration,
        },
    );

    // The HTTP layer takes `service` from here on. Calls made before the
    // database is ready get `Initializing`.
    let init = initialize_in_background(config.connect_target(), gate.clone());
    tracing::info!(ready = service.is_ready(), "Accepting calls");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tokio::select! {
        joined = init => {
            if let Err(e) = joined? {
                tracing::error!(error = %e, "Failed to initialize database");
                return Err(e.into());
            }
            tracing::info!(ready = service.is_ready(), "Database ready, server fully operational");
        }
        signal = &mut shutdown => {
            signal?;
            tracing::info!("Shutting down before the database was ready");
            return Ok(());
        }
    }

    shutdown.await?;
    tracing::info!("Shutting down");
    if let Some(backend) = gate.get() {
        backend.db.pool().close().await;
    }

    Ok(())
}
