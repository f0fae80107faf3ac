use sentra::config::AppConfig;
use sentra::services::{demo, session};
use sentra::{db, routes, state};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");

    if config.demo_login_enabled {
        tracing::warn!("demo login enabled; hardcoded demo credentials are accepted");
        if let Err(e) = demo::seed(&pool).await {
            tracing::error!(error = %e, "demo seed failed");
        }
    }
    if !config.allow_signup {
        tracing::info!("self-service sign-up disabled");
    }

    match session::purge_expired(&pool).await {
        Ok(purged) => tracing::info!(purged, "expired sessions purged"),
        Err(e) => tracing::warn!(error = %e, "session purge failed"),
    }

    let port = config.port;
    let app = routes::app(state::AppState::new(pool, config));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "sentra listening");
    axum::serve(listener, app).await.expect("server failed");
}
