use std::sync::Arc;

use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bank={level},server={level},engine={level},scheduler={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect_database(&settings.database).await?;
    let engine = Arc::new(engine::Engine::builder().database(db).build().await?);

    let server_config = settings.server.to_config();
    let server_engine = Arc::clone(&engine);
    tasks.spawn(async move {
        if let Err(err) = server::run(server_engine, server_config).await {
            tracing::error!("server failed: {err}");
        }
    });

    if settings.scheduler.enabled {
        scheduler::Scheduler::new(engine, settings.scheduler.intervals()).spawn(&mut tasks);
    } else {
        tracing::info!("scheduler disabled");
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            tracing::error!("task failed: {err}");
        }
        tasks.shutdown().await;
    }

    Ok(())
}

async fn connect_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url.as_str()).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
