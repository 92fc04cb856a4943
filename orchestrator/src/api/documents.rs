use std::sync::Arc;

use tracing::info;
use warp::{Rejection, Reply};

use crate::error::reject;
use crate::models::DocumentId;
use crate::orchestrator::QueryOrchestrator;

pub async fn handle_get_document(
    document_id: DocumentId,
    orchestrator: Arc<QueryOrchestrator>,
) -> Result<impl Reply, Rejection> {
    info!("Fetching document: {}", document_id);

    let document = orchestrator
        .hydrate_document(document_id)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&document))
}
