use std::sync::Arc;

use engine::ReceiptClassifier;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "antfarm={level},server={level},engine={level},classifier={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    let classifier = build_classifier(settings.classifier);

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, classifier, listener).await?;

    Ok(())
}

fn build_classifier(config: Option<settings::Classifier>) -> Arc<dyn ReceiptClassifier> {
    let Some(config) = config else {
        tracing::warn!("no classifier settings, receipt analysis is disabled");
        return Arc::new(classifier::Unconfigured);
    };

    let mut gemini = classifier::GeminiClassifier::new(classifier::Client::new(), config.api_key);
    if let Some(model) = config.model {
        gemini = gemini.with_model(model);
    }
    if let Some(endpoint) = config.endpoint {
        gemini = gemini.with_endpoint(endpoint);
    }
    tracing::info!("receipt classifier configured");
    Arc::new(gemini)
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
