//! # Cachet Server
//!
//! Serves the widget demo API with response caching. The store is Redis
//! when `redis.enabled` is set, otherwise an in-process map.

use axum::Router;
use cachet_config::{AppConfig, ConfigLoader};
use cachet_core::{telemetry::init_tracing, CachetError, CachetResult};
use cachet_rest::create_router;
use cachet_server::{
    di::{build_memory_module, build_redis_module},
    startup::{print_banner, print_startup_info},
};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location() {
        Ok(loader) => loader.get().await,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.observability.telemetry()) {
        eprintln!("Failed to initialize tracing: {e}");
    }

    print_banner();
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> CachetResult<()> {
    info!("Environment: {}", config.app.environment);

    let router = if config.redis.enabled {
        create_router(&build_redis_module(&config.redis)?, &config)
    } else {
        create_router(&build_memory_module(), &config)
    };

    serve(router, &config).await
}

async fn serve(router: Router, config: &AppConfig) -> CachetResult<()> {
    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CachetError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    print_startup_info(config);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CachetError::Internal(format!("REST server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
