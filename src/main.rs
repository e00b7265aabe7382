use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devoria::{
    config::Config,
    crypto::keys::KeyMaterial,
    db,
    repositories::{account::PgAccountRepository, article::PgArticleRepository},
    routes::build_router,
    session::{cache::SessionCache, redis_cache::RedisCache},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let keys = match KeyMaterial::load(&config.private_key_path, &config.public_key_path) {
        Ok(keys) => Arc::new(keys),
        Err(e) => {
            tracing::error!("❌ Failed to load signing keys: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("✅ RSA keypair loaded and verified");

    let pool = db::create_pool(&config.database_url, config.database_max_connections)?;
    db::ping(&pool)
        .await
        .context("PostgreSQL is unreachable")?;
    tracing::info!("✅ PostgreSQL pool created");

    let cache = RedisCache::connect(&config.redis_url)
        .await
        .context("Redis is unreachable")?;
    cache.ping().await.context("Redis did not answer PING")?;

    let state = AppState::new(
        &config,
        keys,
        Arc::new(PgAccountRepository::new(pool.clone())),
        Arc::new(PgArticleRepository::new(pool.clone())),
        Arc::new(cache),
    )?;
    tracing::info!("✅ AppState initialized");

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("🚀 Server listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close();
    tracing::info!("👋 Server stopped, connections closed");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("❌ Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("🛑 Shutdown signal received");
}
