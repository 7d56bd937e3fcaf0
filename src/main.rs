use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use mongodb::Client;
use mongodb::bson::doc;
use mongo_insights::config::env_var;
use mongo_insights::helpers::validate::redact_uri_password;
use mongo_insights::{ConnectionProvider, InsightsConfig, InsightsEngine, MongoDatabase};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => InsightsConfig::load_from(&path)?,
        None => InsightsConfig::load()?,
    };
    let database = match &config.database {
        Some(database) => database.clone(),
        None => env_var("MONGO_DATABASE", None)?,
    };

    let client = Client::with_uri_str(&config.mongo_url)
        .await
        .with_context(|| format!("Failed to connect to {}", redact_uri_password(&config.mongo_url)))?;
    let db = client.database(&database);
    db.run_command(doc! { "ping": 1 }).await.context("Primary connection did not answer ping")?;
    log::info!("Connected to {} (database {database})", redact_uri_password(&config.mongo_url));

    let engine = InsightsEngine::new(ConnectionProvider::new(Arc::new(MongoDatabase::new(db))));
    if let Some(url) = &config.analysis_url {
        engine.configure_analysis_connection(url, config.analysis_options()).await?;
    }

    let results = engine.analyze(&config.to_profile_query()).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    engine.clear_analysis_connection().await?;
    client.shutdown().await;
    Ok(())
}
