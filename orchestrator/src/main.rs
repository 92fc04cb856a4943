use std::sync::Arc;

use prometheus::{Encoder, Registry, TextEncoder};
use tracing::info;
use warp::Filter;

use retrieval_orchestrator::config::Config;
use retrieval_orchestrator::embedding_client::EmbeddingServiceClient;
use retrieval_orchestrator::lexical_client::ElasticClient;
use retrieval_orchestrator::metrics::QueryMetrics;
use retrieval_orchestrator::vector_client::QdrantClient;
use retrieval_orchestrator::{api, error, middleware, QueryOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!("Starting hybrid retrieval orchestrator");

    let timeout = config.backend_timeout();
    let lexical_client = ElasticClient::new(&config.lexical_service_url, timeout)?
        .with_fields(&config.document_id_field, &config.document_text_field);
    let vector_client = QdrantClient::new(&config.vector_db_service_url, timeout)?
        .with_api_key(config.vector_db_api_key.clone())
        .with_id_field(&config.document_id_field);
    let embedding_client = EmbeddingServiceClient::new(&config.embedding_service_url, timeout)?;
    info!(
        "Backends: lexical {} (index '{}'), vector {} (collection '{}'), embeddings {}",
        config.lexical_service_url,
        config.lexical_index,
        config.vector_db_service_url,
        config.semantic_collection,
        config.embedding_service_url
    );

    let registry = Registry::new();
    let metrics = QueryMetrics::register(&registry)?;

    let orchestrator = Arc::new(
        QueryOrchestrator::new(config.orchestrator_config()?)
            .with_lexical_backend(Arc::new(lexical_client))
            .with_vector_backend(Arc::new(vector_client))
            .with_embedder(Arc::new(embedding_client))
            .with_metrics(metrics),
    );

    // Build API routes
    let api_routes = api::routes(orchestrator)
        .with(warp::log("api"))
        .with(middleware::cors());

    // Health check route
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "healthy"})));

    // Metrics route
    let metrics = warp::path("metrics").and(warp::get()).map(move || {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        let body = match encoder.encode(&registry.gather(), &mut buffer) {
            Ok(()) => buffer,
            Err(err) => format!("# metrics encoding failed: {}\n", err).into_bytes(),
        };
        warp::reply::with_header(body, "Content-Type", encoder.format_type().to_string())
    });

    let routes = health
        .or(metrics)
        .or(api_routes)
        .recover(error::handle_rejection);

    // Start server
    let addr = ([0, 0, 0, 0], config.port);
    info!("Server listening on {}", addr.1);

    warp::serve(routes).run(addr).await;

    Ok(())
}
