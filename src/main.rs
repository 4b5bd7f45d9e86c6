//! Campus Events Backend
//! Mission: Serve campus event management behind authenticated, role-gated access

use anyhow::{Context, Result};
use campus_events_backend::{
    auth::{AuthService, AuthState, JwtHandler, PasswordHasher, UserStore},
    build_router,
    events::{EventState, EventStore},
    middleware::RateLimiter,
    AppConfig, AppState,
};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🎓 Campus Events backend starting");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    info!("⚙️  {:?}", config);

    // A weak or missing secret aborts startup here
    let jwt = Arc::new(
        JwtHandler::new(&config.jwt_secret, config.token_ttl)
            .context("JWT configuration rejected")?,
    );
    let hasher = PasswordHasher::new(config.bcrypt_cost).context("BCRYPT_COST rejected")?;

    let user_store = Arc::new(
        UserStore::new(&config.database_path).context("Failed to open user store")?,
    );
    let event_store = Arc::new(
        EventStore::new(&config.database_path).context("Failed to open event store")?,
    );

    let service = Arc::new(
        AuthService::new(user_store, hasher, jwt.clone())
            .context("Failed to initialise auth service")?,
    );

    let limiter = RateLimiter::new(config.auth_rate_limit.clone());
    limiter.spawn_cleanup();

    let app = build_router(AppState {
        auth: AuthState::new(service),
        events: EventState::new(event_store),
        jwt,
        limiter,
    });

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_events_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // cwd and parents first, then the crate root when run from elsewhere
    let _ = dotenv();

    let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if crate_env.exists() {
        let _ = dotenv::from_path(&crate_env);
    }
}
