use std::time::Duration;

use thiserror::Error;
use warp::http::StatusCode;
use warp::{reject::Reject, Rejection, Reply};

use crate::backend::Backend;
use crate::models::DocumentId;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{0} backend is not configured")]
    BackendNotConfigured(Backend),

    #[error(
        "Invalid fusion weights: lexical {lexical} and semantic {semantic} must be non-negative and sum to at most 1"
    )]
    InvalidWeights { lexical: f64, semantic: f64 },

    #[error("Invalid modality '{0}'. Choose 'lexical', 'semantic', or 'hybrid'")]
    InvalidModality(String),

    #[error("Invalid result limit {0}: at least one result must be requested")]
    InvalidLimit(usize),

    #[error("{backend} backend timed out after {timeout_ms} ms")]
    BackendTimeout { backend: Backend, timeout_ms: u64 },

    #[error("{backend} backend unavailable: {message}")]
    BackendUnavailable { backend: Backend, message: String },

    #[error("{backend} backend returned a malformed response: {message}")]
    MalformedResponse { backend: Backend, message: String },

    #[error("Document {0} not found in the lexical index during hydration")]
    DocumentNotFound(DocumentId),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn timeout(backend: Backend, timeout: Duration) -> Self {
        SearchError::BackendTimeout {
            backend,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn unavailable(backend: Backend, message: impl Into<String>) -> Self {
        SearchError::BackendUnavailable {
            backend,
            message: message.into(),
        }
    }

    pub fn malformed(backend: Backend, message: impl Into<String>) -> Self {
        SearchError::MalformedResponse {
            backend,
            message: message.into(),
        }
    }

    /// Maps a reqwest failure from one of the HTTP adapters.
    pub fn from_http(backend: Backend, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::timeout(backend, timeout)
        } else if err.is_decode() {
            SearchError::malformed(backend, err.to_string())
        } else {
            SearchError::unavailable(backend, err.to_string())
        }
    }

    /// The backend a failure originated from, if any.
    pub fn backend(&self) -> Option<Backend> {
        match self {
            SearchError::BackendNotConfigured(backend) => Some(*backend),
            SearchError::BackendTimeout { backend, .. }
            | SearchError::BackendUnavailable { backend, .. }
            | SearchError::MalformedResponse { backend, .. } => Some(*backend),
            _ => None,
        }
    }

    /// Request-side errors are rejected before any backend is contacted.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidWeights { .. }
                | SearchError::InvalidModality(_)
                | SearchError::InvalidLimit(_)
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SearchError::BackendTimeout { .. } | SearchError::BackendUnavailable { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl Reject for ApiError {}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            ApiError::Search(err) if err.is_invalid_request() => {
                (StatusCode::BAD_REQUEST, "Bad request")
            }
            ApiError::Search(err) => match err {
                SearchError::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "Document not found"),
                SearchError::BackendNotConfigured(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Backend not configured")
                }
                SearchError::BackendTimeout { .. } => {
                    (StatusCode::GATEWAY_TIMEOUT, "Backend timed out")
                }
                _ => (StatusCode::BAD_GATEWAY, "Backend unavailable"),
            },
        }
    }
}

pub fn reject(err: impl Into<ApiError>) -> Rejection {
    warp::reject::custom(err.into())
}

pub async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Rejection> {
    let (code, message, details) = if let Some(api_err) = err.find::<ApiError>() {
        let (code, message) = api_err.status();
        (code, message, api_err.to_string())
    } else if let Some(body_err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, "Bad request", body_err.to_string())
    } else if let Some(param_err) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, "Bad request", param_err.to_string())
    } else {
        return Err(err);
    };

    let json = warp::reply::json(&serde_json::json!({
        "error": message,
        "details": details,
    }));

    Ok(warp::reply::with_status(json, code))
}
