pub mod fusion;
pub mod hydrator;
pub mod lexical;
pub mod normalizer;
pub mod ranker;
pub mod semantic;

use std::future::Future;
use std::time::Duration;

use crate::backend::Backend;
use crate::error::{Result, SearchError};

pub use fusion::{fuse, FusionWeights};
pub use hydrator::DocumentHydrator;
pub use lexical::LexicalRetriever;
pub use normalizer::{normalize, StopWords};
pub use ranker::rank;
pub use semantic::SemanticRetriever;

// Normalized semantic scores are rounded to this many decimal digits
pub const SEMANTIC_SCORE_DECIMALS: i32 = 5;

pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_millis(5000);

/// Runs one backend call under `timeout`.
pub(crate) async fn bounded<T, F>(backend: Backend, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::timeout(backend, timeout)),
    }
}

/// Divides `score` by the batch maximum. A maximum that is not strictly
/// positive cannot scale anything, so every score collapses to 0.
pub(crate) fn scale(score: f64, max: f64) -> f64 {
    if max > 0.0 && max.is_finite() {
        score / max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_guards_degenerate_maximum() {
        assert_eq!(scale(4.5, 9.0), 0.5);
        assert_eq!(scale(3.0, 0.0), 0.0);
        assert_eq!(scale(3.0, f64::NAN), 0.0);
        assert_eq!(scale(3.0, -1.0), 0.0);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1u8)
        };
        let result = bounded(Backend::Embedding, Duration::from_millis(20), slow).await;
        assert!(matches!(
            result,
            Err(SearchError::BackendTimeout { backend: Backend::Embedding, timeout_ms: 20 })
        ));
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let fast = async { Ok("done") };
        let result = bounded(Backend::Lexical, Duration::from_secs(1), fast).await;
        assert_eq!(result.unwrap(), "done");
    }
}
