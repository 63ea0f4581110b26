use anyhow::Result;
use isyana_orderservice::{
    MIGRATIONS, create_app,
    infra::{
        app_state::AppState,
        bootstrap::{self, bootstrap},
        config, db,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    tracing::info!("Bootstrapping...");
    let db_pool = db::create_pool(&config.database).await?;
    let app = create_app(AppState::new(db_pool));

    bootstrap("OrderService", app, &config.server).await?;
    Ok(())
}
