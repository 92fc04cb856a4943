use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use crate::backend::Backend;
use crate::models::Modality;

/// Query counters, registered on the registry served at `/metrics`.
#[derive(Clone)]
pub struct QueryMetrics {
    queries: IntCounterVec,
    duration: HistogramVec,
    backend_errors: IntCounterVec,
}

impl QueryMetrics {
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let queries = IntCounterVec::new(
            Opts::new("retrieval_queries_total", "Queries executed, by modality and outcome"),
            &["modality", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "retrieval_query_duration_seconds",
                "End-to-end query latency including hydration",
            ),
            &["modality"],
        )?;
        let backend_errors = IntCounterVec::new(
            Opts::new("retrieval_backend_errors_total", "Failed backend calls, by backend"),
            &["backend"],
        )?;

        registry.register(Box::new(queries.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(backend_errors.clone()))?;

        Ok(Self {
            queries,
            duration,
            backend_errors,
        })
    }

    pub fn observe_success(&self, modality: Modality, elapsed: Duration) {
        self.queries
            .with_label_values(&[modality.as_str(), "ok"])
            .inc();
        self.duration
            .with_label_values(&[modality.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    pub fn observe_failure(&self, modality: Modality, backend: Option<Backend>) {
        self.queries
            .with_label_values(&[modality.as_str(), "error"])
            .inc();
        if let Some(backend) = backend {
            self.backend_errors
                .with_label_values(&[backend.as_str()])
                .inc();
        }
    }
}
