use anyhow::Context;
use points_dilution::orchestration::scheduler;
use points_dilution::{
    api, config::Config, init_db, Ingestor, PointsSource, QueryService, Repository,
    ResolvPointsSource, SnapshotStore,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let store: Arc<dyn SnapshotStore> = Arc::new(Repository::new(pool));
    let source: Arc<dyn PointsSource> = Arc::new(
        ResolvPointsSource::new(config.points_api_url.clone(), config.upstream_timeout)
            .context("Failed to build points API client")?,
    );

    let ingestor = Ingestor::new(source.clone(), store.clone());
    let queries = QueryService::new(source, store, config.dilution_mode);

    if let Some(period) = config.ingest_interval {
        scheduler::spawn_periodic(ingestor.clone(), period);
    }
    if config.ingest_secret.is_none() {
        tracing::warn!("INGEST_SECRET is not set; the ingestion trigger is unauthenticated");
    }

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let app = api::create_router(api::AppState::new(
        config,
        Arc::new(queries),
        Arc::new(ingestor),
    ));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
