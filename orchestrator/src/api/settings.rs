use std::sync::Arc;

use warp::{Rejection, Reply};

use crate::models::RescoreRequest;
use crate::orchestrator::QueryOrchestrator;

pub async fn handle_get_settings(
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&orchestrator.settings().await))
}

pub async fn handle_set_rescore(
    request: RescoreRequest,
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    orchestrator.set_rescore(request.rescore).await;
    Ok(warp::reply::json(&orchestrator.settings().await))
}
