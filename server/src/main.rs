use std::net::SocketAddr;
use std::sync::Arc;

use taskboard::auth::{Argon2PasswordHasher, TokenCodec};
use taskboard::store::{InMemoryTaskStore, InMemoryUserStore};
use taskboard::{AppState, ServerConfig, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: listen_port={}, access_token_ttl_minutes={}",
        config.listen_port,
        config.access_token_ttl.num_minutes()
    );

    // Refuse to start with a secret too short to sign with.
    let codec = match TokenCodec::new(&config.jwt_secret, config.access_token_ttl) {
        Ok(codec) => Arc::new(codec),
        Err(e) => {
            tracing::error!("Refusing to start: {e}");
            std::process::exit(1);
        }
    };

    let state = AppState::new(
        codec,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(Argon2PasswordHasher::new()),
    );

    if let Some(admin) = &config.admin {
        if let Err(e) = state.auth.ensure_admin(&admin.email, &admin.password) {
            tracing::error!("Failed to bootstrap admin account: {e}");
            std::process::exit(1);
        }
    }

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
