//! Wiring: configuration -> stores -> services -> router + worker

use crate::routes;
use crate::state::AppState;
use anyhow::Context;
use repoinsight_config::ApplicationConfig;
use repoinsight_ingestion::{GitAcquirer, IngestionPipeline, RegistryEmbedderFactory};
use repoinsight_meta_data::{run_migrations, PgSessionStore, SessionStore};
use repoinsight_query::{QueryService, RegistryChatterFactory};
use repoinsight_search::{Bm25Cache, HybridRetriever};
use repoinsight_tasks::{PgTaskQueue, TaskQueue, Worker, WorkerOptions};
use repoinsight_vector_data::{QdrantStore, VectorStore};
use std::sync::Arc;

/// Fully wired application: the router plus the worker that must be
/// spawned alongside the server
pub struct Application {
    pub router: axum::Router,
    pub worker: Arc<Worker>,
}

/// Build every service from configuration.
///
/// # Errors
///
/// Fails when PostgreSQL or Qdrant are unreachable or migrations fail.
pub async fn build(config: &ApplicationConfig) -> anyhow::Result<Application> {
    let pool = config
        .database
        .create_pool()
        .await
        .context("connecting to PostgreSQL")?;
    run_migrations(&pool).await.context("running migrations")?;

    let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool.clone()));
    let queue: Arc<dyn TaskQueue> = Arc::new(
        PgTaskQueue::new(pool)
            .await
            .context("preparing the task queue")?,
    );

    let vector_store: Arc<dyn VectorStore> = Arc::new(
        QdrantStore::connect(&config.vector_storage)
            .await
            .context("connecting to Qdrant")?,
    );

    let bm25_cache = Arc::new(Bm25Cache::new());
    let embedder_factory = Arc::new(RegistryEmbedderFactory::new(config.embedding));

    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::clone(&sessions),
        Arc::clone(&vector_store),
        Arc::clone(&embedder_factory) as Arc<dyn repoinsight_ingestion::EmbedderFactory>,
        Arc::new(GitAcquirer::new(config.git.clone())),
        config.clone(),
    ));

    let retriever = Arc::new(HybridRetriever::new(
        Arc::clone(&vector_store),
        Arc::clone(&bm25_cache),
        config.retrieval,
    ));
    let query_service = Arc::new(QueryService::new(
        Arc::clone(&sessions),
        Arc::clone(&retriever),
        embedder_factory,
        Arc::new(RegistryChatterFactory),
    ));

    let worker = Arc::new(Worker::new(
        Arc::clone(&queue),
        pipeline,
        query_service,
        WorkerOptions::from_config(&config.worker),
    ));

    let state = AppState::new(
        sessions,
        queue,
        worker.handle(),
        bm25_cache,
        retriever,
        vector_store,
    );

    Ok(Application {
        router: routes::create_router(state),
        worker,
    })
}
