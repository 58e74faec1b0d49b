use anyhow::Result;
use health_text_pipeline::{
    api::{self, AppState},
    cache::TranslationCache,
    config::Config,
    i18n::{LanguageCatalog, TermDictionary},
    provider::build_provider,
    readability::ReadabilityScorer,
    translation::TranslationClient,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("health_text_pipeline=info".parse()?),
        )
        .init();

    info!("Starting health text pipeline");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Provider: {}, default language: {}, cache TTL: {:?}, attempts: {}",
        config.provider, config.default_language, config.cache_ttl, config.max_retries
    );

    let catalog = Arc::new(LanguageCatalog::new());
    let terms = Arc::new(TermDictionary::medical());
    let cache = Arc::new(TranslationCache::new());
    let provider = build_provider(&config)?;

    let client =
        TranslationClient::new(provider, catalog.clone(), terms, cache).with_config(&config);
    let scorer = ReadabilityScorer::new(catalog);

    let app = api::router(Arc::new(AppState { client, scorer }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
