//! Server binary: reads settings, prepares storage and serves the API.

use carbon_campaigns::{
    admin_connect_options, app, ensure_database_exists, AppState, MemoryStore, PgStore, Settings,
    StorageKind,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("carbon_campaigns=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let state = match settings.storage {
        StorageKind::Postgres => {
            if let Some((admin, db_name)) = admin_connect_options(&settings.database_url)? {
                ensure_database_exists(&admin, &db_name).await?;
            }
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            let store = PgStore::new(pool, settings.schema.clone());
            store.ensure_tables().await?;
            tracing::info!(schema = %settings.schema, "postgres store ready");
            AppState::new(store)
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory store; data will not survive a restart");
            AppState::new(MemoryStore::new())
        }
    };

    let router = app(state, settings.body_limit_bytes);
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
