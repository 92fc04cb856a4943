use std::convert::Infallible;
use std::sync::Arc;

use warp::{Filter, Rejection, Reply};

use crate::orchestrator::QueryOrchestrator;

mod documents;
mod query;
mod settings;

pub fn routes(
    orchestrator: Arc<QueryOrchestrator>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api").and(warp::path("v1"));

    let query_route = api
        .and(warp::path("query"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(query::handle_query);

    let get_settings_route = api
        .and(warp::path("settings"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(settings::handle_get_settings);

    let rescore_route = api
        .and(warp::path("settings"))
        .and(warp::path("rescore"))
        .and(warp::path::end())
        .and(warp::put())
        .and(warp::body::json())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(settings::handle_set_rescore);

    let document_route = api
        .and(warp::path("documents"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_orchestrator(orchestrator))
        .and_then(documents::handle_get_document);

    query_route
        .or(get_settings_route)
        .or(rescore_route)
        .or(document_route)
}

fn with_orchestrator(
    orchestrator: Arc<QueryOrchestrator>,
) -> impl Filter<Extract = (Arc<QueryOrchestrator>,), Error = Infallible> + Clone {
    warp::any().map(move || orchestrator.clone())
}
