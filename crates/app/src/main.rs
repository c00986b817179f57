use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use server::{AuthKeys, ServerState};

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "finboard={level},server={level},engine={level},receipts={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect(&settings.server.database).await?;

    let mut builder = engine::Engine::builder().database(db);
    if let Some(cost) = settings.auth.password_cost {
        builder = builder.password_cost(cost);
    }
    let engine = builder.build().await?;

    let auth = AuthKeys::new(
        &settings.auth.jwt_secret,
        chrono::Duration::minutes(settings.auth.token_ttl_minutes),
    );
    let mut state = ServerState::new(engine, auth);

    match &settings.ocr {
        Some(ocr) => {
            let extractor = receipts::MindeeClient::new(ocr.mindee_config())?;
            state = state.with_extractor(Arc::new(extractor));
        }
        None => tracing::warn!("no ocr settings, receipt uploads will fail"),
    }

    let listener = tokio::net::TcpListener::bind(settings.address()).await?;
    server::run_with_listener(state, listener).await?;
    Ok(())
}

async fn connect(config: &settings::Database) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
