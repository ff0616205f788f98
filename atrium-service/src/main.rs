use atrium_service::{
    build_router,
    config::AtriumConfig,
    services::{InMemoryDenyList, MongoDb, RedisDenyList, Stores, TokenDenyList},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::{logging::init_tracing, metrics::init_metrics};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AtriumConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting atrium service"
    );

    tracing::info!("Initializing database connections");
    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "MongoDB is not reachable");
        AppError::DatabaseError(anyhow::anyhow!(e))
    })?;
    tracing::info!("Database initialized successfully");

    let deny_list: Option<Arc<dyn TokenDenyList>> = match (
        config.tokens.revocation_enabled,
        &config.redis,
    ) {
        (false, _) => None,
        (true, Some(redis)) => {
            let list = RedisDenyList::new(redis)
                .await
                .map_err(AppError::InternalError)?;
            tracing::info!("Token revocation enabled (Redis deny-list)");
            Some(Arc::new(list))
        }
        (true, None) => {
            tracing::warn!("Token revocation enabled without REDIS_URL; using a process-local deny-list");
            Some(Arc::new(InMemoryDenyList::new()))
        }
    };

    let state = AppState::new(config.clone(), Stores::mongo(&db), deny_list);
    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
