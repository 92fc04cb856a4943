use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use warp::{Rejection, Reply};

use crate::error::reject;
use crate::models::{QueryRequest, QueryResponse, ResultEntry};
use crate::orchestrator::QueryOrchestrator;

pub async fn handle_query(
    request: QueryRequest,
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    let query = request.into_search_query().map_err(reject)?;
    info!(
        "Processing query [{}] ({}, limit {}): {}",
        request_id, query.modality, query.limit, query.text
    );

    let results = orchestrator.search(&query).await.map_err(reject)?;

    let response = QueryResponse {
        request_id,
        modality: query.modality,
        results: ResultEntry::from_results(results),
        took_ms: started.elapsed().as_millis() as u64,
        completed_at: Utc::now(),
    };

    Ok(warp::reply::json(&response))
}
