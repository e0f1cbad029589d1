//! Server startup utilities.

use cachet_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
                 __         __
  _________ ____/ /_  ___  / /_
 / ___/ __ `/ ___/ __ \/ _ \/ __/
/ /__/ /_/ / /__/ / / /  __/ /_
\___/\__,_/\___/_/ /_/\___/\__/
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let port = config.server.port;
    let store = if config.redis.enabled { "redis" } else { "memory" };
    info!("{}", separator);
    info!("REST API:  http://0.0.0.0:{}/api/v1", port);
    info!("Health:    http://0.0.0.0:{}/health", port);
    info!(
        "Cache:     {} (store: {}, ttl: {}s, default language: {})",
        if config.cache.enabled { "enabled" } else { "disabled" },
        store,
        config.cache.default_ttl_secs,
        config.cache.default_language
    );
    info!("{}", separator);
}
