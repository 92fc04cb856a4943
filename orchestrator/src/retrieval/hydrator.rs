// Document Hydrator: fetches the stored full text of every ranked document

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::warn;

use super::bounded;
use crate::backend::{Backend, LexicalBackend};
use crate::error::{Result, SearchError};
use crate::models::{DocumentId, HydratedDocument};

pub struct DocumentHydrator {
    backend: Option<Arc<dyn LexicalBackend>>,
    index: String,
    timeout: Duration,
}

impl DocumentHydrator {
    pub fn new(index: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend: None,
            index: index.into(),
            timeout,
        }
    }

    pub fn set_backend(&mut self, backend: Arc<dyn LexicalBackend>) {
        self.backend = Some(backend);
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Looks up every id concurrently; the output keeps the input order.
    pub async fn hydrate(&self, document_ids: &[DocumentId]) -> Result<Vec<HydratedDocument>> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(SearchError::BackendNotConfigured(Backend::Lexical))?;

        try_join_all(
            document_ids
                .iter()
                .map(|&document_id| self.fetch(backend.as_ref(), document_id)),
        )
        .await
    }

    pub async fn hydrate_one(&self, document_id: DocumentId) -> Result<HydratedDocument> {
        let mut documents = self.hydrate(&[document_id]).await?;
        documents
            .pop()
            .ok_or(SearchError::DocumentNotFound(document_id))
    }

    async fn fetch(
        &self,
        backend: &dyn LexicalBackend,
        document_id: DocumentId,
    ) -> Result<HydratedDocument> {
        let text = bounded(
            Backend::Lexical,
            self.timeout,
            backend.lookup(&self.index, document_id),
        )
        .await?;

        match text {
            Some(full_text) => Ok(HydratedDocument {
                document_id,
                full_text,
            }),
            None => {
                warn!("Ranked document {} missing from index '{}'", document_id, self.index);
                Err(SearchError::DocumentNotFound(document_id))
            }
        }
    }
}
