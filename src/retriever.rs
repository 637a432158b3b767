use std::sync::Arc;

use tracing::debug;

use crate::embedder::Embedder;
use crate::error::Result;
use crate::utils::WordRecord;
use crate::vector_db::VectorDB;

pub struct Retriever {
    vector_db: VectorDB,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    pub fn new(vector_db: VectorDB, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Retriever {
            vector_db,
            embedder,
            top_k,
        }
    }

    /// The `top_k` records nearest to `query`, best first.
    pub fn retrieve(&self, query: &str) -> Result<Vec<WordRecord>> {
        let query_embedding = self.embedder.embed_one(query)?;

        let hits = self.vector_db.search_similar(&query_embedding, self.top_k);
        debug!(
            "Retrieved {} records for query (best score {:?})",
            hits.len(),
            hits.first().map(|(score, _)| *score)
        );

        Ok(hits.into_iter().map(|(_, doc)| doc.record.clone()).collect())
    }

    pub fn index_size(&self) -> usize {
        self.vector_db.len()
    }
}
